//! Permission Rules
//!
//! Role-derived permission rules, packed into the session token at sign-in
//! and evaluated by the request gate. A rule grants an action over a set of
//! subjects, optionally conditioned on resource ownership.
//!
//! Rules are a snapshot: a role change only takes effect on the next
//! sign-in, when a fresh rule set is packed into a new token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kernel::id::UserId;

use crate::domain::value_object::role_name::RoleName;

/// Version stamp for the packed wire format
const RULE_SET_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Wildcard action, matches every other action
    Manage,
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    /// Wildcard subject, matches every other subject
    #[serde(rename = "all")]
    All,
    User,
    Shop,
    Billboard,
    Brand,
    Category,
    Product,
    Order,
}

/// A single permission grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub action: Action,
    pub subjects: Vec<Subject>,
    /// When set, the rule only applies to resources owned by this user
    pub owner: Option<Uuid>,
}

impl Rule {
    fn matches_action(&self, action: Action) -> bool {
        self.action == Action::Manage || self.action == action
    }

    fn matches_subject(&self, subject: Subject) -> bool {
        self.subjects
            .iter()
            .any(|s| *s == Subject::All || *s == subject)
    }
}

/// Compact tuple encoding of a [`Rule`], serialized as a JSON array
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PackedRule(Action, Vec<Subject>, Option<Uuid>);

/// Versioned, compact rule list as carried inside the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    v: u8,
    rules: Vec<PackedRule>,
}

impl RuleSet {
    pub fn pack(rules: &[Rule]) -> Self {
        Self {
            v: RULE_SET_VERSION,
            rules: rules
                .iter()
                .map(|r| PackedRule(r.action, r.subjects.clone(), r.owner))
                .collect(),
        }
    }

    /// Returns `None` when the version stamp is not understood
    pub fn unpack(self) -> Option<Vec<Rule>> {
        if self.v != RULE_SET_VERSION {
            return None;
        }
        Some(
            self.rules
                .into_iter()
                .map(|PackedRule(action, subjects, owner)| Rule {
                    action,
                    subjects,
                    owner,
                })
                .collect(),
        )
    }
}

/// Build the permission rules for a role
pub fn rules_for(role: RoleName, user_id: &UserId) -> Vec<Rule> {
    match role {
        RoleName::Admin => vec![Rule {
            action: Action::Manage,
            subjects: vec![Subject::All],
            owner: None,
        }],
        RoleName::Moderator => vec![
            Rule {
                action: Action::Read,
                subjects: vec![Subject::All],
                owner: None,
            },
            Rule {
                action: Action::Manage,
                subjects: vec![
                    Subject::Shop,
                    Subject::Billboard,
                    Subject::Category,
                    Subject::Product,
                    Subject::Order,
                ],
                owner: Some(*user_id.as_uuid()),
            },
        ],
    }
}

/// Evaluates permission checks against an unpacked rule snapshot
#[derive(Debug, Clone)]
pub struct Ability {
    rules: Vec<Rule>,
}

impl Ability {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Instance-level check: ownership conditions must hold for the
    /// resource's actual owner.
    pub fn can(&self, action: Action, subject: Subject, resource_owner: Option<Uuid>) -> bool {
        self.rules.iter().any(|rule| {
            rule.matches_action(action)
                && rule.matches_subject(subject)
                && match rule.owner {
                    Some(owner) => resource_owner == Some(owner),
                    None => true,
                }
        })
    }

    /// Type-level check: an ownership condition counts as satisfiable,
    /// since some instance of the subject could match it.
    pub fn can_subject(&self, action: Action, subject: Subject) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.matches_action(action) && rule.matches_subject(subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ability_for(role: RoleName, user_id: &UserId) -> Ability {
        Ability::new(rules_for(role, user_id))
    }

    #[test]
    fn admin_can_do_anything() {
        let user_id = UserId::new();
        let ability = ability_for(RoleName::Admin, &user_id);
        assert!(ability.can(Action::Delete, Subject::User, None));
        assert!(ability.can_subject(Action::Create, Subject::Billboard));
    }

    #[test]
    fn moderator_reads_everything() {
        let user_id = UserId::new();
        let ability = ability_for(RoleName::Moderator, &user_id);
        assert!(ability.can(Action::Read, Subject::User, None));
        assert!(ability.can_subject(Action::Read, Subject::Order));
    }

    #[test]
    fn moderator_writes_only_owned_resources() {
        let user_id = UserId::new();
        let ability = ability_for(RoleName::Moderator, &user_id);

        let owned = Some(*user_id.as_uuid());
        let foreign = Some(Uuid::new_v4());

        assert!(ability.can(Action::Update, Subject::Shop, owned));
        assert!(!ability.can(Action::Update, Subject::Shop, foreign));
        assert!(!ability.can(Action::Update, Subject::Shop, None));

        // Type-level: the ownership condition is satisfiable
        assert!(ability.can_subject(Action::Update, Subject::Shop));
    }

    #[test]
    fn moderator_never_writes_users_or_brands() {
        let user_id = UserId::new();
        let ability = ability_for(RoleName::Moderator, &user_id);
        assert!(!ability.can_subject(Action::Delete, Subject::User));
        assert!(!ability.can_subject(Action::Create, Subject::Brand));
    }

    #[test]
    fn rule_set_round_trips_through_json() {
        let user_id = UserId::new();
        let rules = rules_for(RoleName::Moderator, &user_id);
        let packed = RuleSet::pack(&rules);

        let json = serde_json::to_string(&packed).unwrap();
        let restored: RuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.unpack().unwrap(), rules);
    }

    #[test]
    fn unknown_version_unpacks_to_none() {
        let rule_set = RuleSet {
            v: 99,
            rules: vec![],
        };
        assert!(rule_set.unpack().is_none());
    }
}
