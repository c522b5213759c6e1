use crate::commands::Context;

pub fn run(ctx: &Context) -> miette::Result<()> {
    for entry in ctx.catalog.iter() {
        println!("{:>4}  {:<48}  {}", entry.key, entry.filename, entry.title);
    }
    println!("{} entries", ctx.catalog.len());
    Ok(())
}
