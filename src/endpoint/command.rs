use super::{EndpointDescriptor, ParamKind, ParamSpec};
use clap::builder::PossibleValuesParser;
use clap::{Arg, Command};

fn with_choices(arg: Arg, spec: &ParamSpec) -> Arg {
    match &spec.kind {
        ParamKind::Enum(e) => arg.value_parser(PossibleValuesParser::new(e.values.clone())),
        _ => arg,
    }
}

fn help_for(spec: &ParamSpec) -> String {
    let mut help = spec.description.clone().unwrap_or_default();
    if spec.required {
        if !help.is_empty() {
            help.push(' ');
        }
        help.push_str("(required)");
    }
    help
}

/// Maps a descriptor onto a `clap` command.
///
/// Path parameters become positional arguments in placeholder order; every
/// other parameter is a `--name <value>` option. Nothing is marked required
/// here so that missing values can still be prompted for.
pub fn build_command(descriptor: &EndpointDescriptor) -> Command {
    let mut command = Command::new(descriptor.name.clone())
        .bin_name(format!("cloudapi api {}", descriptor.name))
        .about(descriptor.description.clone().unwrap_or_default())
        .disable_version_flag(true);

    for (index, spec) in descriptor.positional_params().into_iter().enumerate() {
        let arg = Arg::new(spec.name.clone())
            .index(index + 1)
            .value_name(spec.name.clone())
            .help(help_for(spec));
        command = command.arg(with_choices(arg, spec));
    }

    for spec in descriptor.option_params() {
        let arg = Arg::new(spec.name.clone())
            .long(spec.name.clone())
            .num_args(1)
            .value_name(spec.name.clone())
            .help(help_for(spec));
        command = command.arg(with_choices(arg, spec));
    }

    command
}
