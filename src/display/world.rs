//! World display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::worlds::WorldInfo;

#[derive(Tabled)]
struct WorldRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "World")]
    name: String,
    #[tabled(rename = "Path")]
    path: String,
}

/// Format installed worlds, marking the active one
pub fn format_world_list(worlds: &[WorldInfo]) -> String {
    if worlds.is_empty() {
        return "No worlds found.\n".to_string();
    }

    let rows = worlds.iter().map(|world| WorldRow {
        marker: if world.active { "*" } else { "" },
        name: world.name.clone(),
        path: world.path.display().to_string(),
    });

    let mut table = Table::new(rows);
    table.with(Style::blank());
    format!("{}\n", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_world_list() {
        let worlds = vec![
            WorldInfo {
                name: "alpha".into(),
                path: PathBuf::from("/srv/worlds/alpha"),
                active: false,
            },
            WorldInfo {
                name: "beta".into(),
                path: PathBuf::from("/srv/worlds/beta"),
                active: true,
            },
        ];

        let output = format_world_list(&worlds);
        assert!(output.contains("alpha"));
        let beta_line = output.lines().find(|l| l.contains("beta")).unwrap();
        assert!(beta_line.contains('*'));
    }

    #[test]
    fn test_no_worlds() {
        assert_eq!(format_world_list(&[]), "No worlds found.\n");
    }
}
