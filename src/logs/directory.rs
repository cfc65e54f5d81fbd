//! Agent log directory.
//!
//! Agents write `MRA_conversations.log` and `DA-{name}_conversations.log`,
//! either directly into the directory or into per-run sub-folders. A
//! directory or file that does not exist yet is "no data", never an error.

use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::domain::AgentKind;
use crate::error::{BrokerError, Result};

const LOG_SUFFIX: &str = "_conversations.log";
const MRA_FILE: &str = "MRA_conversations.log";
const DA_PREFIX: &str = "DA-";

/// One agent log file found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentLogFile {
    /// Name used in the HTTP surface (`mra`, `DA1`)
    pub name: String,
    #[serde(skip)]
    pub kind: AgentKind,
    pub log_file: String,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LogDirectory {
    root: PathBuf,
}

impl LogDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name an agent writes to
    pub fn file_name_for(agent: &str) -> Result<String> {
        let agent = agent.trim();
        check_component(agent, "agent name")?;

        Ok(if agent.eq_ignore_ascii_case("mra") {
            MRA_FILE.to_string()
        } else if agent.starts_with(DA_PREFIX) {
            format!("{}{}", agent, LOG_SUFFIX)
        } else {
            format!("{}{}{}", DA_PREFIX, agent, LOG_SUFFIX)
        })
    }

    /// Inverse of [`LogDirectory::file_name_for`]; `None` for foreign files
    pub fn agent_for_file(file_name: &str) -> Option<(String, AgentKind)> {
        let stem = file_name.strip_suffix(LOG_SUFFIX)?;
        if stem == "MRA" {
            return Some(("mra".to_string(), AgentKind::RouteManager));
        }
        stem.strip_prefix(DA_PREFIX)
            .filter(|name| !name.is_empty())
            .map(|name| (name.to_string(), AgentKind::Dispatcher))
    }

    /// Directory holding one run's logs (the root when `run` is `None`)
    pub fn run_dir(&self, run: Option<&str>) -> Result<PathBuf> {
        match run {
            None => Ok(self.root.clone()),
            Some(run) => {
                check_component(run, "log folder")?;
                Ok(self.root.join(run))
            }
        }
    }

    /// Run sub-folders, newest (lexicographically greatest) first
    pub fn list_runs(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut runs: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        runs.sort_by(|a, b| b.cmp(a));
        runs
    }

    pub fn latest_run(&self) -> Option<String> {
        self.list_runs().into_iter().next()
    }

    /// Agent logs present for a run: route manager first, then dispatchers by name
    pub fn list_agents(&self, run: Option<&str>) -> Result<Vec<AgentLogFile>> {
        let dir = self.run_dir(run)?;
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Ok(Vec::new());
        };

        let mut agents: Vec<AgentLogFile> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let log_file = entry.file_name().to_str()?.to_string();
                let (name, kind) = Self::agent_for_file(&log_file)?;
                Some(AgentLogFile {
                    name,
                    kind,
                    log_file,
                    path: entry.path(),
                })
            })
            .collect();
        agents.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
        Ok(agents)
    }

    pub fn dispatchers(&self, run: Option<&str>) -> Result<Vec<AgentLogFile>> {
        Ok(self
            .list_agents(run)?
            .into_iter()
            .filter(|a| a.kind == AgentKind::Dispatcher)
            .collect())
    }

    /// Locate one agent's log; `Ok(None)` when it does not exist yet
    pub fn find_agent(&self, run: Option<&str>, agent: &str) -> Result<Option<AgentLogFile>> {
        let log_file = Self::file_name_for(agent)?;
        let path = self.run_dir(run)?.join(&log_file);
        if !path.is_file() {
            return Ok(None);
        }

        let (name, kind) = Self::agent_for_file(&log_file)
            .unwrap_or_else(|| (agent.to_string(), AgentKind::Dispatcher));
        Ok(Some(AgentLogFile {
            name,
            kind,
            log_file,
            path,
        }))
    }

    /// Read a log file; unreadable or missing files read as `None`
    pub fn read(&self, file: &AgentLogFile) -> Option<String> {
        match std::fs::read(&file.path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %file.path.display(), "cannot read agent log: {}", e);
                None
            }
        }
    }
}

fn check_component(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(BrokerError::validation(format!("{} required", what)));
    }
    if value == "." || value.contains("..") || value.contains('/') || value.contains('\\') {
        return Err(BrokerError::validation(format!("invalid {}: {}", what, value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_file_names() {
        assert_eq!(LogDirectory::file_name_for("mra").unwrap(), "MRA_conversations.log");
        assert_eq!(LogDirectory::file_name_for("MRA").unwrap(), "MRA_conversations.log");
        assert_eq!(LogDirectory::file_name_for("DA1").unwrap(), "DA-DA1_conversations.log");
        assert_eq!(LogDirectory::file_name_for("DA-DA1").unwrap(), "DA-DA1_conversations.log");
        assert!(LogDirectory::file_name_for("../etc/passwd").is_err());
        assert!(LogDirectory::file_name_for("").is_err());
    }

    #[test]
    fn test_agent_for_file() {
        assert_eq!(
            LogDirectory::agent_for_file("DA-DA1_conversations.log"),
            Some(("DA1".to_string(), AgentKind::Dispatcher))
        );
        assert_eq!(
            LogDirectory::agent_for_file("MRA_conversations.log"),
            Some(("mra".to_string(), AgentKind::RouteManager))
        );
        assert_eq!(LogDirectory::agent_for_file("notes.txt"), None);
        assert_eq!(LogDirectory::agent_for_file("Other_conversations.log"), None);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = LogDirectory::new("/definitely/not/here/logs");
        assert!(dir.list_agents(None).unwrap().is_empty());
        assert!(dir.list_runs().is_empty());
        assert!(dir.find_agent(None, "mra").unwrap().is_none());
    }

    #[test]
    fn test_lists_agents_and_runs() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("DA-DA2_conversations.log"), "[t] a").unwrap();
        fs::write(tmp.path().join("MRA_conversations.log"), "[t] b").unwrap();
        fs::write(tmp.path().join("DA-DA1_conversations.log"), "[t] c").unwrap();
        fs::write(tmp.path().join("readme.md"), "x").unwrap();
        fs::create_dir(tmp.path().join("2024-01-01_10-00")).unwrap();
        fs::create_dir(tmp.path().join("2024-01-02_09-00")).unwrap();

        let dir = LogDirectory::new(tmp.path());
        let names: Vec<_> = dir
            .list_agents(None)
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["mra", "DA1", "DA2"]);
        assert_eq!(dir.dispatchers(None).unwrap().len(), 2);
        assert_eq!(dir.latest_run().as_deref(), Some("2024-01-02_09-00"));
        assert!(dir.list_agents(Some("2024-01-01_10-00")).unwrap().is_empty());
        assert!(dir.run_dir(Some("..")).is_err());

        let mra = dir.find_agent(None, "mra").unwrap().unwrap();
        assert_eq!(dir.read(&mra).as_deref(), Some("[t] b"));
    }
}
