use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cfg = attestant::config::Config::parse();
    attestant::run(cfg)
}
