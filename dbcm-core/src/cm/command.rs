//! `cm_ctl res` command lines

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use dbcm_common::Error;

use super::attrs::{AttrPayload, InstanceAttributes, ResourceAttributes};

/// Cluster-manager control binary
pub const CM_CTL: &str = "cm_ctl";

/// Resource action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResAction {
    Add,
    Edit,
}

impl ResAction {
    fn flag(&self) -> &'static str {
        match self {
            Self::Add => "--add",
            Self::Edit => "--edit",
        }
    }

    fn payload_flag(&self) -> &'static str {
        match self {
            Self::Add => "--res_attr",
            Self::Edit => "--add_inst",
        }
    }
}

impl fmt::Display for ResAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Edit => write!(f, "edit"),
        }
    }
}

impl FromStr for ResAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "edit" => Ok(Self::Edit),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

/// A single `cm_ctl res` control command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceCommand {
    action: ResAction,
    name: String,
    payload: String,
}

impl ResourceCommand {
    /// Build a command from an already rendered payload (`"k=v,..."`)
    pub fn new(action: ResAction, name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            action,
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Register a resource
    pub fn add(name: impl Into<String>, attrs: &ResourceAttributes) -> Self {
        Self::new(ResAction::Add, name, attrs.render())
    }

    /// Add an instance to an existing resource
    pub fn edit(name: impl Into<String>, attrs: &InstanceAttributes) -> Self {
        Self::new(ResAction::Edit, name, attrs.render())
    }

    /// Parse `action` and build the command; unknown actions are rejected
    pub fn parse(action: &str, name: impl Into<String>, payload: impl Into<String>) -> dbcm_common::Result<Self> {
        let action = action.parse::<ResAction>()?;
        Ok(Self::new(action, name, payload))
    }

    pub fn action(&self) -> ResAction {
        self.action
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Shell command line, e.g.
    /// `cm_ctl res --add --res_name dn1 --res_attr="resources_type=DN,..."`
    pub fn to_command_line(&self) -> String {
        format!(
            "{} res {} --res_name {} {}={}",
            CM_CTL,
            self.action.flag(),
            self.name,
            self.action.payload_flag(),
            self.payload
        )
    }

    /// Arguments after the program name, for exec without a shell. The
    /// payload quotes are stripped since no shell will remove them.
    pub fn args(&self) -> Vec<String> {
        let unquoted = self
            .payload
            .strip_prefix('"')
            .and_then(|p| p.strip_suffix('"'))
            .unwrap_or(&self.payload);

        vec![
            "res".to_string(),
            self.action.flag().to_string(),
            "--res_name".to_string(),
            self.name.clone(),
            format!("{}={}", self.action.payload_flag(), unquoted),
        ]
    }
}

impl fmt::Display for ResourceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_command_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cm::attrs::ResourceType;

    #[test]
    fn test_add_command_line() {
        let attrs = ResourceAttributes::new("/opt/dn_ctl.sh", ResourceType::Dn);
        let cmd = ResourceCommand::add("dn1", &attrs);
        assert_eq!(
            cmd.to_string(),
            "cm_ctl res --add --res_name dn1 --res_attr=\"resources_type=DN,script=/opt/dn_ctl.sh,\
             check_interval=1,time_out=120,restart_times=5,restart_delay=1,restart_period=1\""
        );
    }

    #[test]
    fn test_edit_command_line() {
        let attrs = InstanceAttributes::new(2, 21, "/data/dss");
        let cmd = ResourceCommand::edit("dss", &attrs);
        assert_eq!(
            cmd.to_string(),
            "cm_ctl res --edit --res_name dss --add_inst=\"node_id=2,res_instance_id=21,res_args=/data/dss\""
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let attrs = ResourceAttributes::new("/opt/dn_ctl.sh", ResourceType::Dn);
        let first = ResourceCommand::add("dn1", &attrs).to_command_line();
        for _ in 0..10 {
            assert_eq!(ResourceCommand::add("dn1", &attrs).to_command_line(), first);
        }
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = ResourceCommand::parse("delete", "dn1", "\"a=b\"").unwrap_err();
        assert!(matches!(err, Error::InvalidAction(ref a) if a == "delete"));
        assert!("".parse::<ResAction>().is_err());
    }

    #[test]
    fn test_action_parse_case_insensitive() {
        assert_eq!("ADD".parse::<ResAction>().unwrap(), ResAction::Add);
        assert_eq!(" edit ".parse::<ResAction>().unwrap(), ResAction::Edit);
    }

    #[test]
    fn test_args_strip_quotes() {
        let attrs = InstanceAttributes::new(1, 20, "/opt/dss");
        let args = ResourceCommand::edit("dss", &attrs).args();
        assert_eq!(
            args,
            vec![
                "res",
                "--edit",
                "--res_name",
                "dss",
                "--add_inst=node_id=1,res_instance_id=20,res_args=/opt/dss",
            ]
        );
    }
}
