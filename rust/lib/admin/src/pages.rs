//! Sidebar navigation.

use fleetdesk_client::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tab {
    pub name: &'static str,
    pub href: &'static str,
    pub resource: Resource,
}

pub const SIDEBAR_TABS: [Tab; 4] = [
    Tab { name: "Transporter", href: "/transporters", resource: Resource::Transporters },
    Tab { name: "Material", href: "/materials", resource: Resource::Materials },
    Tab { name: "Vehicle Type", href: "/vehicle-types", resource: Resource::VehicleTypes },
    Tab { name: "Shipments", href: "/shipments", resource: Resource::Shipments },
];

/// Tab whose page owns `href` (exact match or a sub-path).
pub fn active_tab(href: &str) -> Option<&'static Tab> {
    SIDEBAR_TABS.iter().find(|t| {
        href == t.href || href.strip_prefix(t.href).is_some_and(|rest| rest.starts_with('/'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hrefs_match_resource_paths() {
        for tab in &SIDEBAR_TABS {
            assert_eq!(tab.href, tab.resource.collection_path());
        }
    }

    #[test]
    fn active_tab_matches_sub_paths_only() {
        assert_eq!(active_tab("/materials").map(|t| t.name), Some("Material"));
        assert_eq!(active_tab("/materials/4").map(|t| t.name), Some("Material"));
        assert_eq!(active_tab("/material-categories"), None);
    }
}
