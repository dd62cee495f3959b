#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = campus_quiz::run().await {
        eprintln!("campus-quiz fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
