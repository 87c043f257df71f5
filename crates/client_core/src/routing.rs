//! Maps the policy service's raw `privacy_action` onto a processing destination.

use shared::domain::RouteDecision;

/// Case-insensitive; first matching rule wins and anything unrecognised
/// (including the empty string) stays on-premises.
pub fn classify(raw: &str) -> RouteDecision {
    let action = raw.to_ascii_uppercase();
    if action.contains("CLOUD") || action == "ALLOW_CLOUD" {
        return RouteDecision::Cloud;
    }
    if action.contains("LOCAL") || action.contains("PREM") || action == "ROUTE_PREM" {
        return RouteDecision::Local;
    }
    RouteDecision::Local
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_actions_route_to_cloud() {
        assert_eq!(classify("ALLOW_CLOUD"), RouteDecision::Cloud);
        assert_eq!(classify("allow_cloud"), RouteDecision::Cloud);
        assert_eq!(classify("something cloudy"), RouteDecision::Cloud);
        assert_eq!(classify("REDACT_CLOUD"), RouteDecision::Cloud);
    }

    #[test]
    fn premises_actions_route_locally() {
        assert_eq!(classify("ROUTE_PREM"), RouteDecision::Local);
        assert_eq!(classify("route_local"), RouteDecision::Local);
        assert_eq!(classify("on-prem only"), RouteDecision::Local);
    }

    #[test]
    fn cloud_rule_wins_over_local_rule() {
        assert_eq!(classify("LOCAL_THEN_CLOUD"), RouteDecision::Cloud);
    }

    #[test]
    fn unknown_and_empty_actions_default_to_local() {
        assert_eq!(classify(""), RouteDecision::Local);
        assert_eq!(classify("BLOCK"), RouteDecision::Local);
    }
}
