// src/main.rs

use treemirror::{cli, logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // --help and --version are reported through clap errors too.
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    if let Err(err) = run_main(args).await {
        eprintln!("treemirror error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main(args: cli::CliArgs) -> anyhow::Result<()> {
    logging::init_logging(args.log_level)?;
    run(args).await?;
    Ok(())
}
