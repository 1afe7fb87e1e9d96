use std::process;

fn main() {
    match docmark_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("docmark error: {err:#}");
            process::exit(1);
        }
    }
}
