use anyhow::Result;
use stressmap::cli::{self, Commands};
use stressmap::commands::{self, CatalogCommandConfig, ScoreConfig};

fn main() -> Result<()> {
    let cli = cli::parse_args();

    match cli.command {
        Commands::Score {
            contexts,
            catalog,
            config,
            format,
            output,
            jobs,
            month,
            no_parallel,
            verbosity,
        } => {
            cli::init_logging(verbosity);
            commands::score_contexts(ScoreConfig {
                contexts,
                catalog,
                config,
                format,
                output,
                jobs,
                month,
                no_parallel,
            })?;
        }
        Commands::Catalog {
            catalog,
            json,
            verbosity,
        } => {
            cli::init_logging(verbosity);
            let stdout = std::io::stdout();
            commands::describe_catalog(
                &CatalogCommandConfig { catalog, json },
                &mut stdout.lock(),
            )?;
        }
        Commands::Init { force } => {
            cli::init_logging(0);
            commands::init_config(force)?;
        }
    }

    Ok(())
}
