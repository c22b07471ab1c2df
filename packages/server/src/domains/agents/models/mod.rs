mod agent;
mod agent_filter_rule;
mod agent_required_tag_kind;
mod agent_run;
mod agent_search_query;
mod agent_website;
mod assistant_config;
mod curator_config;

pub use agent::Agent;
pub use agent_filter_rule::AgentFilterRule;
pub use agent_required_tag_kind::AgentRequiredTagKind;
pub use agent_run::{AgentRun, AgentRunStat};
pub use agent_search_query::AgentSearchQuery;
pub use agent_website::AgentWebsite;
pub use assistant_config::{AgentAssistantConfig, ADMIN_AGENT_PREAMBLE, PUBLIC_AGENT_PREAMBLE};
pub use curator_config::AgentCuratorConfig;
