use std::fs;
use std::path::Path;

use clap::CommandFactory;

// cli.rs only needs clap, clap_complete and humantime, all of which are
// build-dependencies, so it can be compiled into the build script as-is.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR").expect("OUT_DIR not set by Cargo");
    let man_dir = Path::new(&out_dir).join("man");
    fs::create_dir_all(&man_dir).expect("failed to create man output directory");

    render_man(&cli::Cli::command(), &man_dir);
}

/// Write `<name>.1` for `cmd`, then `<name>-<sub>.1` for each visible subcommand.
fn render_man(cmd: &clap::Command, dir: &Path) {
    let name = cmd.get_name().to_owned();

    let mut page = Vec::new();
    if let Err(e) = clap_mangen::Man::new(cmd.clone()).render(&mut page) {
        panic!("failed to render man page for `{name}`: {e}");
    }
    let path = dir.join(format!("{name}.1"));
    if let Err(e) = fs::write(&path, page) {
        panic!("failed to write {}: {e}", path.display());
    }

    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        let renamed = sub.clone().name(format!("{name}-{}", sub.get_name()));
        render_man(&renamed, dir);
    }
}
