use anyhow::Result;
use scoremap::cli::commands::{
    handle_init_command, handle_render_command, handle_validate_command, RenderConfig,
};
use scoremap::cli::{init_tracing, parse_args, Commands};

fn main() -> Result<()> {
    let cli = parse_args();
    init_tracing(cli.verbosity)?;

    match cli.command {
        Commands::Render {
            scores,
            order,
            config,
            format,
            strict,
        } => handle_render_command(RenderConfig {
            scores,
            order,
            config,
            format,
            strict,
        }),
        Commands::Validate { scores, config } => handle_validate_command(scores, config),
        Commands::Init { force } => handle_init_command(force),
    }
}
