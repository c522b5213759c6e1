use crate::commands::Context;
use mnemo_library::generate::status;

fn keys(keys: &[u32]) -> String {
    if keys.is_empty() {
        return "-".to_string();
    }
    keys.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
}

pub async fn run(ctx: &Context) -> miette::Result<()> {
    let pool = ctx.pool()?;
    let listing = ctx.listing(&pool).await?;
    let status = status(&ctx.catalog, &listing);
    println!("pool:      {}", ctx.config.pool.display());
    println!("generated: {}", keys(&status.generated));
    println!("missing:   {}", keys(&status.missing));
    println!("{}/{} generated", status.generated.len(), status.total());
    Ok(())
}
