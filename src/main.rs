use clap::Parser;
use miette::Result;
use tagscope::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    tagscope::core::logging::init(global.verbose, global.quiet);

    match cli.command {
        Commands::Companies => tagscope::cli::commands::company::run_companies(&global).await,
        Commands::Properties => tagscope::cli::commands::company::run_properties(&global).await,
        Commands::Rule(cmd) => tagscope::cli::commands::rule::run(cmd, &global).await,
        Commands::De(cmd) => tagscope::cli::commands::data_element::run(cmd, &global).await,
        Commands::Lib(cmd) => tagscope::cli::commands::library::run(cmd, &global).await,
        Commands::Scan(args) => tagscope::cli::commands::scan::run(args, &global).await,
        Commands::ExecOrder(args) => tagscope::cli::commands::exec_order::run(args, &global).await,
        Commands::Config(cmd) => tagscope::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => tagscope::cli::commands::completions::run(args),
    }
}
