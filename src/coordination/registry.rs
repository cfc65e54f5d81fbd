use dashmap::DashMap;

use crate::domain::{AgentStatusRecord, AgentStatusSummary};

/// Agent name -> last reported status. Last write wins, no merge of `info`.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: DashMap<String, AgentStatusRecord>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record for `record.name`, returning the previous one
    pub fn upsert(&self, record: AgentStatusRecord) -> Option<AgentStatusRecord> {
        self.agents.insert(record.name.clone(), record)
    }

    pub fn get(&self, name: &str) -> Option<AgentStatusRecord> {
        self.agents.get(name).map(|r| r.value().clone())
    }

    pub fn summary(&self) -> AgentStatusSummary {
        let records = self.agents.iter().map(|r| r.value().clone()).collect();
        AgentStatusSummary::from_records(records)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
