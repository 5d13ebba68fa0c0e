#[tokio::main]
async fn main() {
    if let Err(e) = oncoguide_lib::run().await {
        eprintln!("oncoguide: {e}");
        std::process::exit(1);
    }
}
