use clap::{CommandFactory, Parser};

use splitmerge::params::Parameters;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let params = Parameters::parse();
    if !params.has_required_paths() {
        Parameters::command().print_help()?;
        std::process::exit(1);
    }
    splitmerge::run(&params)
}
