#![allow(missing_docs)]

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let summary = swapi_harvester_lib::run().await?;
    println!("{summary}");
    Ok(())
}
