use std::path::Path;

use tally_core::Offer;
use tally_pool::ResourcePool;

pub fn run(offers: &Path) -> anyhow::Result<()> {
    let offers: Vec<Offer> = super::read_json(offers)?;
    let pool = ResourcePool::from_offers(&offers);
    println!("{}", format_pool(&pool));
    Ok(())
}

/// One line per `(resource, role)`, roles in allocation order.
pub fn format_pool(pool: &ResourcePool) -> String {
    let mut lines = Vec::new();
    for name in pool.names() {
        for role in pool.roles(name) {
            let value = match pool.get(name, role) {
                Some(tally_core::ResourceValue::Scalar(v)) => format!("{v}"),
                Some(tally_core::ResourceValue::Ranges(ranges)) => ranges
                    .iter()
                    .map(|r| format!("[{}-{}]", r.begin, r.end))
                    .collect::<Vec<_>>()
                    .join(","),
                None => continue,
            };
            lines.push(format!("{name:<8} {role:<12} {value}"));
        }
    }
    lines.join("\n")
}
