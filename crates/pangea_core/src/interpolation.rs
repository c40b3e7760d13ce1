//! Terraform interpolation strings.

/// Build `${type.name.attribute}`.
pub fn resource_attribute(resource_type: &str, name: &str, attribute: &str) -> String {
    format!("${{{}.{}.{}}}", resource_type, name, attribute)
}

/// Build `${var.name}`.
pub fn variable(name: &str) -> String {
    format!("${{var.{}}}", name)
}

/// Check whether a string is a Terraform interpolation expression.
pub fn is_interpolation(value: &str) -> bool {
    value.starts_with("${") && value.ends_with('}') && value.len() > 3
}
