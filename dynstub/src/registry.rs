//! # Service Registry
//!
//! Maps logical service identifiers to resolved service contracts.
//!
//! A [`StubRegistry`] wraps a `prost_reflect::DescriptorPool` and is the single
//! point where a `package` + `Service` pair turns into something callable. The
//! resolution happens once: a [`ServiceContract`] carries the descriptor of every
//! method together with its [`CallShape`], so nothing downstream ever has to
//! inspect types or descriptors again to decide how a method must be invoked.
//!
//! All lookup failures are configuration defects (a wrong package or service
//! name in the caller's setup); they are surfaced immediately as [`LookupError`]
//! and are never retried.
use crate::naming::{self, EmptyIdentifier};
use prost_reflect::{
    DescriptorError, DescriptorPool, MessageDescriptor, MethodDescriptor, ServiceDescriptor,
};
use prost_types::FileDescriptorSet;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The single error kind for failed name resolution.
///
/// Every variant is a non-retryable caller defect.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("service '{0}' is not present in the registry")]
    ServiceNotFound(String),

    #[error("method '{method}' is not defined on service '{service}'")]
    MethodNotFound { service: String, method: String },

    #[error("method '{method}' on service '{service}' is a {shape} call and has no blocking form")]
    NotBlocking {
        service: String,
        method: String,
        shape: CallShape,
    },

    #[error(transparent)]
    EmptyIdentifier(#[from] EmptyIdentifier),
}

/// The invocation style of a single RPC method.
///
/// Derived from the streaming flags of the method descriptor when the contract
/// is built, never inferred from return types at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    /// One request, one response.
    Unary,
    /// A sequence of requests, one response.
    ClientStreaming,
    /// One request, a sequence of responses.
    ServerStreaming,
    /// Both sides stream.
    Bidirectional,
}

impl CallShape {
    fn of(method: &MethodDescriptor) -> Self {
        match (method.is_client_streaming(), method.is_server_streaming()) {
            (false, false) => CallShape::Unary,
            (true, false) => CallShape::ClientStreaming,
            (false, true) => CallShape::ServerStreaming,
            (true, true) => CallShape::Bidirectional,
        }
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallShape::Unary => "unary",
            CallShape::ClientStreaming => "client streaming",
            CallShape::ServerStreaming => "server streaming",
            CallShape::Bidirectional => "bidirectional streaming",
        };
        f.write_str(name)
    }
}

/// A logical service identifier: a Protobuf package plus a service name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceId {
    package: String,
    service: String,
}

impl ServiceId {
    /// Builds an identifier from a package and a service name.
    ///
    /// Both parts must be non-empty; an empty part is a configuration error.
    pub fn new(
        package: impl Into<String>,
        service: impl Into<String>,
    ) -> Result<Self, LookupError> {
        let package = package.into();
        let service = service.into();
        if package.is_empty() || service.is_empty() {
            return Err(EmptyIdentifier.into());
        }
        Ok(Self { package, service })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// The fully qualified service name, e.g. `echo.EchoService`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.package, self.service)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.service)
    }
}

impl FromStr for ServiceId {
    type Err = LookupError;

    /// Splits a fully qualified name at its last dot.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (package, service) = s.rsplit_once('.').ok_or(EmptyIdentifier)?;
        ServiceId::new(package, service)
    }
}

/// A resolved RPC method: its descriptor plus its call shape.
#[derive(Debug, Clone)]
pub struct MethodContract {
    descriptor: MethodDescriptor,
    shape: CallShape,
    calling_name: String,
}

impl MethodContract {
    fn new(descriptor: MethodDescriptor) -> Result<Self, LookupError> {
        let shape = CallShape::of(&descriptor);
        let calling_name = naming::to_lower_camel(descriptor.name())?;
        Ok(Self {
            descriptor,
            shape,
            calling_name,
        })
    }

    /// The method name as defined in the Protobuf source, e.g. `SayHello`.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// The lowerCamelCase calling-convention name, e.g. `sayHello`.
    pub fn calling_name(&self) -> &str {
        &self.calling_name
    }

    pub fn shape(&self) -> CallShape {
        self.shape
    }

    /// Descriptor of the request message.
    pub fn input(&self) -> MessageDescriptor {
        self.descriptor.input()
    }

    /// Descriptor of the response message.
    pub fn output(&self) -> MessageDescriptor {
        self.descriptor.output()
    }

    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }
}

/// A resolved service: the callable surface a stub dispatches through.
///
/// The method table is keyed by the Protobuf method name, which is unique
/// within a service. Calling-convention lookups go through the precomputed
/// lowerCamelCase name of each entry, so two methods whose names differ only
/// in case both stay addressable.
#[derive(Debug, Clone)]
pub struct ServiceContract {
    descriptor: ServiceDescriptor,
    methods: HashMap<String, MethodContract>,
}

impl ServiceContract {
    fn new(descriptor: ServiceDescriptor) -> Result<Self, LookupError> {
        let mut methods = HashMap::new();
        for method in descriptor.methods() {
            let key = method.name().to_string();
            methods.insert(key, MethodContract::new(method)?);
        }
        Ok(Self {
            descriptor,
            methods,
        })
    }

    /// The fully qualified service name.
    pub fn full_name(&self) -> &str {
        self.descriptor.full_name()
    }

    pub fn package_name(&self) -> &str {
        self.descriptor.package_name()
    }

    /// Looks up a method by its calling-convention name.
    ///
    /// The supplied name is case-converted first, so `unary_echo`, `UnaryEcho`
    /// and `unaryEcho` all resolve to the same contract. An exact Protobuf
    /// name match takes precedence over the converted form.
    pub fn method(&self, name: &str) -> Result<&MethodContract, LookupError> {
        if let Some(method) = self.methods.get(name) {
            return Ok(method);
        }
        let key = naming::to_lower_camel(name)?;
        self.methods
            .values()
            .find(|m| m.calling_name() == key)
            .ok_or_else(|| LookupError::MethodNotFound {
                service: self.full_name().to_string(),
                method: name.to_string(),
            })
    }

    /// Looks up a method by its Protobuf name, as it appears in request paths.
    pub fn method_by_proto_name(&self, name: &str) -> Option<&MethodContract> {
        self.methods.get(name)
    }

    /// Iterates over every method of the service, in no particular order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodContract> {
        self.methods.values()
    }
}

/// An explicit registry of gRPC service schemas.
///
/// Construction is the configuration step: once a registry holds a descriptor
/// pool, every later resolution is a pure in-memory lookup.
#[derive(Debug, Clone)]
pub struct StubRegistry {
    pool: DescriptorPool,
}

impl StubRegistry {
    /// Builds a registry from a byte-encoded `FileDescriptorSet`.
    pub fn decode(file_descriptor_set: &[u8]) -> Result<Self, DescriptorError> {
        let pool = DescriptorPool::decode(file_descriptor_set)?;
        Ok(Self { pool })
    }

    /// Builds a registry from a decoded `FileDescriptorSet`.
    pub fn from_file_descriptor_set(set: FileDescriptorSet) -> Result<Self, DescriptorError> {
        let pool = DescriptorPool::from_file_descriptor_set(set)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: DescriptorPool) -> Self {
        Self { pool }
    }

    /// Lists the fully qualified names of every registered service.
    pub fn list_services(&self) -> Vec<String> {
        self.pool
            .services()
            .map(|s| s.full_name().to_string())
            .collect()
    }

    /// Resolves the contract of a service.
    ///
    /// This is the operation behind every stub and server constructor; a miss
    /// means the identifier does not match any registered schema.
    pub fn contract(&self, id: &ServiceId) -> Result<ServiceContract, LookupError> {
        let full_name = id.full_name();
        let descriptor = self
            .pool
            .get_service_by_name(&full_name)
            .ok_or(LookupError::ServiceNotFound(full_name))?;
        let contract = ServiceContract::new(descriptor)?;
        tracing::debug!(
            service = contract.full_name(),
            methods = contract.methods.len(),
            "resolved service contract"
        );
        Ok(contract)
    }
}
