//! Shared validation helpers for user-supplied names

/// Validate a queue name: lowercase alphanumeric and hyphens only.
/// These names end up in config files and in `wrangler queues create`
/// invocations, so anything outside the safe character class is rejected.
pub fn validate_queue_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Queue name cannot be empty".to_string());
    }
    for ch in name.chars() {
        match ch {
            'a'..='z' | '0'..='9' | '-' => {}
            _ => {
                return Err(format!(
                    "Invalid character '{}' in queue name (use lowercase letters, digits, and hyphens)",
                    ch
                ));
            }
        }
    }
    Ok(())
}

/// Validate a binding name: an uppercase identifier (`[A-Z][A-Z0-9_]*`).
/// Bindings become global identifiers in the generated worker source.
pub fn validate_binding_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err("Binding name cannot be empty".to_string()),
        Some('A'..='Z') => {}
        Some(ch) => {
            return Err(format!(
                "Binding name must start with an uppercase letter, got '{}'",
                ch
            ));
        }
    }
    for ch in chars {
        match ch {
            'A'..='Z' | '0'..='9' | '_' => {}
            _ => {
                return Err(format!(
                    "Invalid character '{}' in binding name (use A-Z, 0-9, and underscores)",
                    ch
                ));
            }
        }
    }
    Ok(())
}

/// Validate a project directory name: same character class as queue names.
pub fn validate_project_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Project name cannot be empty".to_string());
    }
    for ch in name.chars() {
        match ch {
            'a'..='z' | '0'..='9' | '-' => {}
            _ => {
                return Err(format!(
                    "Invalid character '{}' in project name (use lowercase letters, digits, and hyphens)",
                    ch
                ));
            }
        }
    }
    Ok(())
}

/// Derive a default binding name from a queue name:
/// `demo-queue` becomes `DEMO_QUEUE`. Queue names may start with a digit
/// but binding names must not, so those get a `Q_` prefix.
pub fn binding_from_queue(queue_name: &str) -> String {
    let upper: String = queue_name
        .chars()
        .map(|ch| match ch {
            '-' => '_',
            _ => ch.to_ascii_uppercase(),
        })
        .collect();
    match upper.chars().next() {
        Some('A'..='Z') => upper,
        _ => format!("Q_{}", upper),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_name_valid() {
        assert!(validate_queue_name("demo-queue").is_ok());
        assert!(validate_queue_name("q1").is_ok());
        assert!(validate_queue_name("a-b-c-123").is_ok());
    }

    #[test]
    fn test_queue_name_rejects_uppercase_and_underscores() {
        assert!(validate_queue_name("Demo_Queue").is_err());
        assert!(validate_queue_name("demo_queue").is_err());
        assert!(validate_queue_name("demo queue").is_err());
        assert!(validate_queue_name("").is_err());
    }

    #[test]
    fn test_binding_name_valid() {
        assert!(validate_binding_name("DEMO_QUEUE").is_ok());
        assert!(validate_binding_name("Q").is_ok());
        assert!(validate_binding_name("EVENT_STORE_2").is_ok());
    }

    #[test]
    fn test_binding_name_rejects_lowercase() {
        assert!(validate_binding_name("demo_queue").is_err());
        assert!(validate_binding_name("_QUEUE").is_err());
        assert!(validate_binding_name("1QUEUE").is_err());
        assert!(validate_binding_name("").is_err());
    }

    #[test]
    fn test_project_name() {
        assert!(validate_project_name("my-worker").is_ok());
        assert!(validate_project_name("My Worker").is_err());
    }

    #[test]
    fn test_binding_from_queue() {
        assert_eq!(binding_from_queue("demo-queue"), "DEMO_QUEUE");
        assert_eq!(binding_from_queue("jobs"), "JOBS");
        assert_eq!(binding_from_queue("a-1-b"), "A_1_B");
    }

    #[test]
    fn test_binding_from_queue_is_always_a_valid_binding() {
        // Valid queue names may start with a digit; bindings must not
        assert_eq!(binding_from_queue("1jobs"), "Q_1JOBS");
        for queue in ["1jobs", "2-phase-commit", "99"] {
            assert!(validate_queue_name(queue).is_ok());
            assert!(validate_binding_name(&binding_from_queue(queue)).is_ok());
        }
    }
}
