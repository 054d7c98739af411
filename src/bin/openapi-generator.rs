use anyhow::Result;
use disc_rooms_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    let doc = ApiDoc::openapi();
    println!("{}", doc.to_pretty_json()?);
    Ok(())
}
