// Writes leadboard.1 (and one page per subcommand) into the given directory

use clap::CommandFactory;
use clap_mangen::Man;
use leadboard::cli::Cli;
use std::path::{Path, PathBuf};

fn render(cmd: &clap::Command, name: &str, out_dir: &Path) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    Man::new(cmd.clone()).title(name).render(&mut buffer)?;
    std::fs::write(out_dir.join(format!("{}.1", name)), buffer)?;

    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        let sub_name = format!("{}-{}", name, sub.get_name());
        render(sub, &sub_name, out_dir)?;
    }
    Ok(())
}

fn main() -> std::io::Result<()> {
    let out_dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("man"));
    std::fs::create_dir_all(&out_dir)?;

    let cmd = Cli::command();
    render(&cmd, cmd.get_name(), &out_dir)?;
    println!("Man pages written to {}", out_dir.display());
    Ok(())
}
