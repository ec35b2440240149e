use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Extensions are compared case-insensitively, so `PICK.CSV` passes for `csv`.
pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        validate_path(field_name, file)?;

        match std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(extension) if allowed_set.contains(extension.to_lowercase().as_str()) => {}
            Some(extension) => {
                return Err(EtlError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(EtlError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| EtlError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output_path", "./output").is_ok());
        assert!(validate_path("output_path", "").is_err());
        assert!(validate_path("output_path", "out\0put").is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["pick.csv".to_string(), "PACK.CSV".to_string()];
        assert!(validate_file_extensions("files", &files, &["csv"]).is_ok());

        let invalid_files = vec!["pick.xlsx".to_string()];
        assert!(validate_file_extensions("files", &invalid_files, &["csv"]).is_err());

        let no_extension = vec!["pick".to_string()];
        assert!(validate_file_extensions("files", &no_extension, &["csv"]).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("userMappings.json".to_string());
        assert!(validate_required_field("users.mappings_path", &present).is_ok());

        let missing: Option<String> = None;
        let err = validate_required_field("users.mappings_path", &missing).unwrap_err();
        assert!(matches!(err, EtlError::MissingConfigError { .. }));
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("job.name", "night shift").is_ok());
        assert!(validate_non_empty_string("job.name", "   ").is_err());
    }
}
