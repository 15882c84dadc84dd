use serde::{Deserialize, Serialize};

/// The mode a scope is declared under (§3, §4.3). Governs which enforcement
/// features are active for the lifetime of that scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
    Programming,
    Content,
    Devops,
    Research,
    Generic,
}

impl Default for TaskMode {
    fn default() -> Self {
        TaskMode::Programming
    }
}

impl TaskMode {
    /// Unknown mode strings fall back to `programming` (§4.3).
    pub fn parse(raw: &str) -> Self {
        match raw {
            "content" => TaskMode::Content,
            "devops" => TaskMode::Devops,
            "research" => TaskMode::Research,
            "generic" => TaskMode::Generic,
            "programming" => TaskMode::Programming,
            _ => TaskMode::Programming,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskMode::Programming => "programming",
            TaskMode::Content => "content",
            TaskMode::Devops => "devops",
            TaskMode::Research => "research",
            TaskMode::Generic => "generic",
        }
    }

    /// The instructions preamble emitted alongside `set_scope` (§4.3).
    pub fn preamble(&self) -> &'static str {
        match self {
            TaskMode::Programming => {
                "Programming mode: every tracked file is syntax-validated and \
                 scope-checked; inspect the database schema before touching \
                 schema-affecting files; run the checklist before finishing."
            }
            TaskMode::Content => {
                "Content mode: track word counts and chapter progress; syntax \
                 validation and database enforcement are disabled."
            }
            TaskMode::Devops => {
                "Devops mode: commands are logged, checkpoints and health \
                 checks are tracked; HTTP and scope enforcement remain active."
            }
            TaskMode::Research => {
                "Research mode: track sources and indexed facts; no file \
                 syntax or scope enforcement applies."
            }
            TaskMode::Generic => {
                "Generic mode: file tracking only, no specialized enforcement."
            }
        }
    }
}

/// Closed capability table, a pure function of `TaskMode` (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeFeatures {
    pub syntax_validation: bool,
    pub db_enforcement: bool,
    pub http_enforcement: bool,
    pub scope_enforcement: bool,
    pub file_tracking: bool,
    pub word_count: bool,
    pub chapter_tracking: bool,
    pub command_logging: bool,
    pub checkpoints: bool,
    pub health_checks: bool,
    pub source_tracking: bool,
    pub fact_indexing: bool,
}

impl ModeFeatures {
    pub fn for_mode(mode: TaskMode) -> Self {
        match mode {
            TaskMode::Programming => Self {
                syntax_validation: true,
                db_enforcement: true,
                http_enforcement: true,
                scope_enforcement: true,
                file_tracking: true,
                word_count: false,
                chapter_tracking: false,
                command_logging: false,
                checkpoints: false,
                health_checks: false,
                source_tracking: false,
                fact_indexing: false,
            },
            TaskMode::Content => Self {
                syntax_validation: false,
                db_enforcement: false,
                http_enforcement: false,
                scope_enforcement: false,
                file_tracking: true,
                word_count: true,
                chapter_tracking: true,
                command_logging: false,
                checkpoints: false,
                health_checks: false,
                source_tracking: false,
                fact_indexing: false,
            },
            TaskMode::Devops => Self {
                syntax_validation: false,
                db_enforcement: false,
                http_enforcement: true,
                scope_enforcement: true,
                file_tracking: true,
                word_count: false,
                chapter_tracking: false,
                command_logging: true,
                checkpoints: true,
                health_checks: true,
                source_tracking: false,
                fact_indexing: false,
            },
            TaskMode::Research => Self {
                syntax_validation: false,
                db_enforcement: false,
                http_enforcement: false,
                scope_enforcement: false,
                file_tracking: false,
                word_count: false,
                chapter_tracking: false,
                command_logging: false,
                checkpoints: false,
                health_checks: false,
                source_tracking: true,
                fact_indexing: true,
            },
            TaskMode::Generic => Self {
                syntax_validation: false,
                db_enforcement: false,
                http_enforcement: false,
                scope_enforcement: false,
                file_tracking: true,
                word_count: false,
                chapter_tracking: false,
                command_logging: false,
                checkpoints: false,
                health_checks: false,
                source_tracking: false,
                fact_indexing: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_falls_back_to_programming() {
        assert_eq!(TaskMode::parse("sorcery"), TaskMode::Programming);
    }

    #[test]
    fn programming_enables_syntax_and_db() {
        let f = ModeFeatures::for_mode(TaskMode::Programming);
        assert!(f.syntax_validation);
        assert!(f.db_enforcement);
        assert!(f.http_enforcement);
    }

    #[test]
    fn research_enables_only_source_and_fact_tracking() {
        let f = ModeFeatures::for_mode(TaskMode::Research);
        assert!(f.source_tracking);
        assert!(f.fact_indexing);
        assert!(!f.file_tracking);
        assert!(!f.syntax_validation);
    }

    #[test]
    fn devops_enables_command_logging_and_health_checks() {
        let f = ModeFeatures::for_mode(TaskMode::Devops);
        assert!(f.command_logging);
        assert!(f.checkpoints);
        assert!(f.health_checks);
        assert!(!f.syntax_validation);
        assert!(!f.db_enforcement);
    }
}
