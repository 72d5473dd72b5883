use clap::ValueEnum;
use shipit_slack_runtime::DeployConfirmationMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliTransportMode {
    Socket,
    Http,
}

impl CliTransportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CliTransportMode::Socket => "socket",
            CliTransportMode::Http => "http",
        }
    }

    pub fn is_socket(self) -> bool {
        matches!(self, CliTransportMode::Socket)
    }

    pub fn is_http(self) -> bool {
        matches!(self, CliTransportMode::Http)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliDeployConfirmationMode {
    Modal,
    None,
}

impl From<CliDeployConfirmationMode> for DeployConfirmationMode {
    fn from(value: CliDeployConfirmationMode) -> Self {
        match value {
            CliDeployConfirmationMode::Modal => DeployConfirmationMode::Modal,
            CliDeployConfirmationMode::None => DeployConfirmationMode::None,
        }
    }
}
