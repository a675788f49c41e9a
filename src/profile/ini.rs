// Minimal INI editing for the AWS shared files
use std::collections::HashSet;

/// One `[name]` block with its comment lines and key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub comments: Vec<String>,
    pub entries: Vec<(String, String)>,
}

impl Section {
    pub fn has_comment(&self, comment: &str) -> bool {
        self.comments.iter().any(|c| c == comment)
    }

    /// Value of a `# Key: value` metadata comment
    pub fn comment_value(&self, key: &str) -> Option<&str> {
        self.comments.iter().find_map(|c| {
            c.strip_prefix('#')?
                .trim_start()
                .strip_prefix(key)?
                .strip_prefix(':')
                .map(str::trim)
        })
    }
}

fn section_header(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() >= 2 {
        Some(trimmed[1..trimmed.len() - 1].trim())
    } else {
        None
    }
}

pub fn parse_sections(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for line in content.lines() {
        if let Some(name) = section_header(line) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(Section {
                name: name.to_string(),
                ..Default::default()
            });
            continue;
        }

        let Some(section) = current.as_mut() else {
            continue;
        };
        let trimmed = line.trim();
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            section.comments.push(trimmed.to_string());
        } else if let Some((key, value)) = trimmed.split_once('=') {
            section
                .entries
                .push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    if let Some(section) = current {
        sections.push(section);
    }
    sections
}

/// Update or add a section, replacing its header comments when `comments` is given
///
/// Header comments are the ones between `[name]` and the first key. Comment
/// and blank lines after a key stay where they are, since in AWS files they
/// usually describe the next section. Lines outside the target section are
/// copied through unchanged.
pub fn update_section(
    content: &str,
    section_name: &str,
    key_values: &[(&str, &str)],
    comments: Option<&[String]>,
) -> String {
    let mut result = String::new();
    let mut in_target_section = false;
    let mut section_found = false;
    let mut seen_key = false;
    // Non-key lines after a key; flushed before the next key or after
    // the missing keys at the end of the section
    let mut trailing: Vec<&str> = Vec::new();
    let mut updated_keys: HashSet<&str> = HashSet::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(section) = section_header(line) {
            if in_target_section {
                push_missing(&mut result, key_values, &updated_keys);
                flush(&mut result, &mut trailing);
                updated_keys.clear();
            }

            in_target_section = section == section_name;
            seen_key = false;
            result.push_str(line);
            result.push('\n');

            if in_target_section {
                section_found = true;
                for comment in comments.unwrap_or_default() {
                    result.push_str(comment);
                    result.push('\n');
                }
            }
            continue;
        }

        if in_target_section {
            let is_comment = trimmed.starts_with('#') || trimmed.starts_with(';');

            if !seen_key {
                if is_comment && comments.is_some() {
                    continue;
                }
            } else if is_comment || trimmed.is_empty() {
                trailing.push(line);
                continue;
            }

            flush(&mut result, &mut trailing);
            if let Some((key, _)) = trimmed.split_once('=') {
                seen_key = true;

                let key = key.trim();
                if let Some((k, new_value)) = key_values.iter().find(|(k, _)| *k == key) {
                    result.push_str(&format!("{} = {}\n", key, new_value));
                    updated_keys.insert(*k);
                    continue;
                }
            }
        }

        result.push_str(line);
        result.push('\n');
    }

    if in_target_section {
        push_missing(&mut result, key_values, &updated_keys);
        flush(&mut result, &mut trailing);
    }

    if !section_found {
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&format!("[{}]\n", section_name));
        for comment in comments.unwrap_or_default() {
            result.push_str(comment);
            result.push('\n');
        }
        push_missing(&mut result, key_values, &HashSet::new());
    }

    cleanup_empty_lines(&result)
}

fn flush(result: &mut String, lines: &mut Vec<&str>) {
    for line in lines.drain(..) {
        result.push_str(line);
        result.push('\n');
    }
}

fn push_missing(result: &mut String, key_values: &[(&str, &str)], updated: &HashSet<&str>) {
    for (key, value) in key_values {
        if !updated.contains(key) {
            result.push_str(&format!("{} = {}\n", key, value));
        }
    }
}

/// Clean up empty lines in INI files:
/// - Remove leading empty lines
/// - Ensure exactly one blank line between sections
/// - Remove trailing empty lines
fn cleanup_empty_lines(content: &str) -> String {
    let mut result = String::new();
    let mut previous_blank = false;
    let mut at_start = true;

    for line in content.lines() {
        let is_blank = line.trim().is_empty();

        if at_start && is_blank {
            continue;
        }
        if !is_blank {
            at_start = false;
        }
        if is_blank && previous_blank {
            continue;
        }

        result.push_str(line);
        result.push('\n');
        previous_blank = is_blank;
    }

    while result.ends_with("\n\n") {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[default]
aws_access_key_id = MANUAL

[dev-admin]
# Managed by awsw
# Account: 111
aws_access_key_id = OLD
aws_session_token = OLD
";

    #[test]
    fn test_parse_sections() {
        let sections = parse_sections(SAMPLE);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "default");
        assert!(sections[0].comments.is_empty());
        assert_eq!(sections[1].comment_value("Account"), Some("111"));
        assert_eq!(sections[1].comment_value("Role"), None);
        assert!(sections[1].has_comment("# Managed by awsw"));
        assert_eq!(
            sections[1].entries[0],
            ("aws_access_key_id".to_string(), "OLD".to_string())
        );
    }

    #[test]
    fn test_update_existing_section_replaces_values_and_comments() {
        let comments = vec!["# Managed by awsw".to_string(), "# Account: 111".to_string()];
        let updated = update_section(
            SAMPLE,
            "dev-admin",
            &[
                ("aws_access_key_id", "NEW"),
                ("aws_secret_access_key", "S"),
                ("aws_session_token", "T"),
            ],
            Some(comments.as_slice()),
        );

        assert_eq!(
            updated,
            "\
[default]
aws_access_key_id = MANUAL

[dev-admin]
# Managed by awsw
# Account: 111
aws_access_key_id = NEW
aws_session_token = T
aws_secret_access_key = S
"
        );
    }

    #[test]
    fn test_update_keeps_comment_of_following_section() {
        let content = "\
[dev-admin]
# Managed by awsw
# Account: 111
aws_access_key_id = OLD

# personal keys, do not delete
[personal]
aws_access_key_id = MINE
";
        let comments = vec!["# Managed by awsw".to_string(), "# Account: 111".to_string()];
        let updated = update_section(
            content,
            "dev-admin",
            &[("aws_access_key_id", "NEW"), ("aws_session_token", "T")],
            Some(comments.as_slice()),
        );

        assert_eq!(
            updated,
            "\
[dev-admin]
# Managed by awsw
# Account: 111
aws_access_key_id = NEW
aws_session_token = T

# personal keys, do not delete
[personal]
aws_access_key_id = MINE
"
        );
    }

    #[test]
    fn test_update_keeps_comments_between_keys() {
        let content = "[dev]\n# old header\nregion = us-east-1\n; note\noutput = json\n";
        let comments = vec!["# new header".to_string()];
        let updated = update_section(
            content,
            "dev",
            &[("region", "eu-west-1")],
            Some(comments.as_slice()),
        );

        assert_eq!(
            updated,
            "[dev]\n# new header\nregion = eu-west-1\n; note\noutput = json\n"
        );
    }

    #[test]
    fn test_update_appends_new_section() {
        let updated = update_section(SAMPLE, "profile prod", &[("region", "eu-west-1")], None);
        assert!(updated.starts_with(SAMPLE));
        assert!(updated.ends_with("\n\n[profile prod]\nregion = eu-west-1\n"));
    }

    #[test]
    fn test_update_empty_file() {
        let updated = update_section("", "dev-admin", &[("region", "us-east-1")], None);
        assert_eq!(updated, "[dev-admin]\nregion = us-east-1\n");
    }

    #[test]
    fn test_cleanup_empty_lines() {
        assert_eq!(
            cleanup_empty_lines("\n\n[a]\nk = v\n\n\n\n[b]\n\n\n"),
            "[a]\nk = v\n\n[b]\n"
        );
    }
}
