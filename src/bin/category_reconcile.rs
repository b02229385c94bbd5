use category_reconcile::{
    cli::{output, run_cli},
    init,
};

fn main() {
    let _ = dotenvy::dotenv();
    init();

    if let Err(err) = run_cli() {
        output::error(format!("Error: {err}"));
        std::process::exit(1);
    }
}
