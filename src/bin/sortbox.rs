use anyhow::Result;

fn main() -> Result<()> {
    sortbox::cli::run()
}
