//! # Identifier Case Conversion
//!
//! gRPC code generators emit lowerCamelCase method identifiers on their calling
//! surfaces, while Protobuf definitions commonly use `snake_case`. This module
//! holds the conversion used to normalize a caller-supplied method name before it
//! is looked up on a service contract.

/// Error returned when an identifier to convert is empty.
///
/// An empty method name is a caller defect, not a valid input.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("identifier must not be empty")]
pub struct EmptyIdentifier;

/// Converts an underscore-separated identifier into lowerCamelCase.
///
/// The first character is lowercased unconditionally. Every character that
/// follows an underscore is uppercased and the underscore dropped; all other
/// characters are copied verbatim. There is no Unicode normalization and no
/// locale sensitivity.
///
/// Re-applying the conversion to its own output returns it unchanged.
///
/// # Examples
///
/// ```
/// use dynstub::naming::to_lower_camel;
///
/// assert_eq!(to_lower_camel("get_user").unwrap(), "getUser");
/// assert_eq!(to_lower_camel("SayHello").unwrap(), "sayHello");
/// ```
pub fn to_lower_camel(ident: &str) -> Result<String, EmptyIdentifier> {
    let mut chars = ident.chars();
    let first = chars.next().ok_or(EmptyIdentifier)?;

    let mut converted = String::with_capacity(ident.len());
    converted.extend(first.to_lowercase());

    let mut after_underscore = false;
    for c in chars {
        if c == '_' {
            after_underscore = true;
        } else {
            if after_underscore {
                converted.extend(c.to_uppercase());
            } else {
                converted.push(c);
            }
            after_underscore = false;
        }
    }

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_snake_case() {
        assert_eq!(to_lower_camel("get_user").unwrap(), "getUser");
        assert_eq!(to_lower_camel("a_b_c").unwrap(), "aBC");
    }

    #[test]
    fn decapitalizes_first_letter() {
        assert_eq!(to_lower_camel("SayHello").unwrap(), "sayHello");
    }

    #[test]
    fn drops_trailing_underscore() {
        assert_eq!(to_lower_camel("send_").unwrap(), "send");
    }

    #[test]
    fn converted_output_is_a_fixed_point() {
        for ident in ["get_user", "SayHello", "a_b_c", "sayHello"] {
            let once = to_lower_camel(ident).unwrap();
            let twice = to_lower_camel(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(to_lower_camel(""), Err(EmptyIdentifier));
    }
}
