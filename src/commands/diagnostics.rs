//! Device listing through an optional diagnostic tool (`aplay -l`).

use crate::command_traits::CommandArgs;

#[derive(Debug, Clone)]
pub struct ListDevicesArgs {
    pub tool: String,
    pub args: Vec<String>,
}

impl CommandArgs for ListDevicesArgs {
    fn program(&self) -> &str {
        &self.tool
    }

    fn to_cli_args(&self) -> Vec<String> {
        self.args.clone()
    }
}
