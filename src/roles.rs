//! Role Catalog (spec.md §4.1): a declarative, immutable registry of role
//! metadata indexed by [`RoleId`]. Pure data plus a handful of derived
//! queries — no role ever carries behavior of its own (spec.md §9's
//! "collapse deep role inheritance to a data record" redesign note).

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::protocol::types::{Faction, RoleId, SeerResult, Team};

/// Which wire schema a role's night action is validated and decoded against
/// (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaId {
    /// A single seat target.
    Target,
    /// Witch save/poison/skip.
    Witch,
    /// Magician's two-seat swap.
    MagicianSwap,
    /// The consolidated wolf-meeting vote.
    WolfVote,
}

/// Night-1 action metadata for a role.
#[derive(Debug, Clone, Copy)]
pub struct Night1Spec {
    /// Whether this role acts at all on the first night.
    pub has_action: bool,
    /// Sort key for [`crate::night::plan::build_night_plan`]; ties are
    /// broken by template insertion order, then role id.
    pub order: i32,
    pub schema: SchemaId,
}

/// Wolf-meeting participation metadata.
#[derive(Debug, Clone, Copy)]
pub struct WolfMeetingSpec {
    pub participates_in_wolf_vote: bool,
    pub can_see_wolves: bool,
}

/// Immunity/eligibility flags referenced by the death resolver and
/// ingress validators.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleFlags {
    pub immune_to_wolf_kill: bool,
    pub immune_to_poison: bool,
    /// Whether the witch may target herself with `save`. Witch-specific;
    /// `decode_witch_action` is the only reader, keyed off `witch`'s own
    /// action schema rather than this flag, so it still special-cases the
    /// witch's role id to find the save wire in the first place.
    pub can_save_self: bool,
    /// spec.md §4.4 gate 4's `target` schema: "one seat, alive, not self
    /// unless allowed". Generic across every `Target`-schema role (guard,
    /// seer, psychic, gargoyle); no catalog entry opts in today, so a
    /// `target`-schema role always rejects a self-target until one sets
    /// this to `true`.
    pub can_target_self: bool,
}

/// One role's full declarative spec.
#[derive(Debug, Clone)]
pub struct RoleSpec {
    pub id: RoleId,
    pub faction: Faction,
    pub team: Team,
    pub display_name: &'static str,
    pub night1: Night1Spec,
    pub wolf_meeting: WolfMeetingSpec,
    pub flags: RoleFlags,
}

fn spec(
    id: &'static str,
    faction: Faction,
    team: Team,
    display_name: &'static str,
    night1: Night1Spec,
    wolf_meeting: WolfMeetingSpec,
    flags: RoleFlags,
) -> RoleSpec {
    RoleSpec {
        id: RoleId::new(id),
        faction,
        team,
        display_name,
        night1,
        wolf_meeting,
        flags,
    }
}

fn no_action() -> Night1Spec {
    Night1Spec {
        has_action: false,
        order: i32::MAX,
        schema: SchemaId::Target,
    }
}

fn no_wolf_meeting() -> WolfMeetingSpec {
    WolfMeetingSpec {
        participates_in_wolf_vote: false,
        can_see_wolves: false,
    }
}

/// Builds the static catalog. Order values follow the conventional Werewolf
/// night sequence: guard, wolves, seer, witch, then the special roles that
/// only some templates include.
fn build_catalog() -> HashMap<RoleId, RoleSpec> {
    let mut roles = Vec::new();

    roles.push(spec(
        "wolf",
        Faction::Wolf,
        Team::Wolf,
        "狼人",
        Night1Spec {
            has_action: true,
            order: 20,
            schema: SchemaId::WolfVote,
        },
        WolfMeetingSpec {
            participates_in_wolf_vote: true,
            can_see_wolves: true,
        },
        RoleFlags::default(),
    ));

    roles.push(spec(
        "guard",
        Faction::God,
        Team::Good,
        "守卫",
        Night1Spec {
            has_action: true,
            order: 10,
            schema: SchemaId::Target,
        },
        no_wolf_meeting(),
        RoleFlags::default(),
    ));

    roles.push(spec(
        "seer",
        Faction::God,
        Team::Good,
        "预言家",
        Night1Spec {
            has_action: true,
            order: 30,
            schema: SchemaId::Target,
        },
        no_wolf_meeting(),
        RoleFlags::default(),
    ));

    roles.push(spec(
        "witch",
        Faction::God,
        Team::Good,
        "女巫",
        Night1Spec {
            has_action: true,
            order: 40,
            schema: SchemaId::Witch,
        },
        no_wolf_meeting(),
        RoleFlags {
            can_save_self: false,
            ..RoleFlags::default()
        },
    ));

    roles.push(spec(
        "psychic",
        Faction::God,
        Team::Good,
        "通灵师",
        Night1Spec {
            has_action: true,
            order: 35,
            schema: SchemaId::Target,
        },
        no_wolf_meeting(),
        RoleFlags::default(),
    ));

    roles.push(spec(
        "gargoyle",
        Faction::Special,
        Team::Third,
        "石像鬼",
        Night1Spec {
            has_action: true,
            order: 36,
            schema: SchemaId::Target,
        },
        no_wolf_meeting(),
        RoleFlags::default(),
    ));

    roles.push(spec(
        "magician",
        Faction::Special,
        Team::Third,
        "魔术师",
        Night1Spec {
            has_action: true,
            order: 5,
            schema: SchemaId::MagicianSwap,
        },
        no_wolf_meeting(),
        RoleFlags::default(),
    ));

    roles.push(spec(
        "nightmare",
        Faction::Wolf,
        Team::Wolf,
        "梦魇",
        Night1Spec {
            has_action: true,
            order: 15,
            schema: SchemaId::Target,
        },
        WolfMeetingSpec {
            participates_in_wolf_vote: true,
            can_see_wolves: true,
        },
        RoleFlags::default(),
    ));

    roles.push(spec(
        "wolf_king",
        Faction::Wolf,
        Team::Wolf,
        "狼王",
        no_action(),
        WolfMeetingSpec {
            participates_in_wolf_vote: true,
            can_see_wolves: true,
        },
        RoleFlags::default(),
    ));

    roles.push(spec(
        "villager",
        Faction::Villager,
        Team::Good,
        "平民",
        no_action(),
        no_wolf_meeting(),
        RoleFlags::default(),
    ));

    roles.push(spec(
        "hunter",
        Faction::Villager,
        Team::Good,
        "猎人",
        no_action(),
        no_wolf_meeting(),
        RoleFlags::default(),
    ));

    roles.push(spec(
        "idiot",
        Faction::Villager,
        Team::Good,
        "白痴",
        no_action(),
        no_wolf_meeting(),
        RoleFlags::default(),
    ));

    roles.into_iter().map(|r| (r.id.clone(), r)).collect()
}

fn catalog() -> &'static HashMap<RoleId, RoleSpec> {
    static CATALOG: OnceLock<HashMap<RoleId, RoleSpec>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

/// The sentinel spec returned for an unknown role id (spec.md §4.1
/// "unknown ids yield a defined sentinel (team='good', faction='villager')
/// and log a warning").
fn unknown_sentinel(id: &RoleId) -> RoleSpec {
    RoleSpec {
        id: id.clone(),
        faction: Faction::Villager,
        team: Team::Good,
        display_name: "未知角色",
        night1: no_action(),
        wolf_meeting: no_wolf_meeting(),
        flags: RoleFlags::default(),
    }
}

/// Looks up a role's spec. Never panics: unknown ids yield a logged
/// sentinel rather than an error, since a catalog miss is a data-content
/// problem (a stale template referencing a retired role), not a bug in the
/// caller.
pub fn get(id: &RoleId) -> RoleSpec {
    match catalog().get(id) {
        Some(found) => found.clone(),
        None => {
            tracing::warn!(role_id = %id, "role catalog miss; using sentinel spec");
            unknown_sentinel(id)
        }
    }
}

/// Whether every role referenced by `ids` (deduplicated) has a catalog
/// entry. Used by the strict-invariant check in spec.md §7
/// ("RoleCatalogInconsistent").
pub fn all_known(ids: impl IntoIterator<Item = RoleId>) -> bool {
    let cat = catalog();
    ids.into_iter().all(|id| cat.contains_key(&id))
}

pub fn is_wolf_role(id: &RoleId) -> bool {
    get(id).team == Team::Wolf
}

/// Seer check result per spec.md §4.1: wolf-team ⇒ '狼人', else '好人'.
pub fn seer_check_result(id: &RoleId) -> SeerResult {
    if is_wolf_role(id) {
        SeerResult::Wolf
    } else {
        SeerResult::Good
    }
}

/// All role ids in the catalog flagged immune to the wolf kill.
pub fn wolf_kill_immune_role_ids() -> Vec<RoleId> {
    catalog()
        .values()
        .filter(|r| r.flags.immune_to_wolf_kill)
        .map(|r| r.id.clone())
        .collect()
}
