use anyhow::Result;

use dzt::filter::spec::FilterKind;

pub fn cmd_filters() -> Result<()> {
    for kind in FilterKind::ALL {
        println!("{:<10} {}", kind.alias(), kind.display_name());
        println!("{:<10} {}", "", kind.description());
        if !kind.params().is_empty() {
            println!("{:<10} params: {}", "", kind.params().join(", "));
        }
        println!();
    }
    Ok(())
}
