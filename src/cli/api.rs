use crate::binding::{bind, RawInput};
use crate::cli::ProcessCommand;
use crate::context::Context;
use crate::endpoint::command::build_command;
use crate::endpoint::EndpointDescriptor;
use crate::error::{Error, ExitStatus, Result};
use crate::prompt::fill_missing;
use async_trait::async_trait;
use clap::error::ErrorKind;
use clap::Args;
use colored::Colorize;
use std::fmt::Debug;

#[derive(Debug, Args)]
#[command(disable_help_flag = true)]
pub struct ApiArgs {
    /// Endpoint command, e.g. applications:list. Lists all endpoints when omitted.
    pub endpoint: Option<String>,

    /// Describe the endpoint, or list all endpoints when none is given.
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub help: bool,

    /// Arguments and options for the endpoint; `--help` describes them.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

fn list_endpoints(descriptors: &[EndpointDescriptor]) {
    let width = descriptors
        .iter()
        .map(|descriptor| descriptor.name.len())
        .max()
        .unwrap_or(0);

    println!("{}", "Available endpoints:".yellow());
    for descriptor in descriptors {
        let name = format!("{:width$}", descriptor.name, width = width);
        println!(
            "  {}  {}",
            name.green(),
            descriptor.description.as_deref().unwrap_or_default()
        );
    }
}

#[async_trait]
impl ProcessCommand for ApiArgs {
    async fn process_command(&self, context: &Context) -> Result<ExitStatus> {
        let descriptors = context.descriptors()?;
        let Some(name) = &self.endpoint else {
            list_endpoints(&descriptors);
            return Ok(ExitStatus::Success);
        };

        let descriptor = descriptors
            .iter()
            .find(|descriptor| &descriptor.name == name)
            .ok_or_else(|| Error::InputError(format!("Command \"{}\" is not defined.", name)))?;

        let argv = std::iter::once(name.clone())
            .chain(self.help.then(|| "--help".to_string()))
            .chain(self.args.iter().cloned());
        let matches = match build_command(descriptor).try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(e) if e.kind() == ErrorKind::DisplayHelp => {
                e.print()?;
                return Ok(ExitStatus::Success);
            }
            Err(e) => return Err(Error::InputError(e.render().to_string().trim_end().to_string())),
        };

        let dispatcher = context.dispatcher()?;
        let mut input = RawInput::from_matches(descriptor, &matches);
        fill_missing(
            descriptor,
            &mut input,
            context.prompter(),
            context.is_interactive(),
        )?;
        let request = bind(descriptor, &input)?;
        tracing::info!(endpoint = %descriptor.name, "Executing endpoint");

        let response = dispatcher.execute(&request).await?;
        println!("{}", response.to_pretty_json()?);

        Ok(response.exit_status())
    }
}
