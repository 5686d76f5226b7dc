use std::collections::HashSet;
use std::sync::LazyLock;

/// Known chat bots that slip past the suffix heuristics.
static BOT_LIST: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "nightbot",
        "streamelements",
        "fossabot",
        "moobot",
        "wizebot",
        "soundalerts",
        "commanderroot",
        "anotherttvviewer",
        "lurxx",
        "streamlabs",
        "stay_hydrated_bot",
        "vivbot",
        "drapsnatt",
        "logviewer",
        "supibot",
        "okayegbot",
        "botrixoficial",
        "streamholics",
        "own3d",
        "playwithviewersbot",
        "lolrankbot",
        "pokemoncommunitygame",
        "sery_bot",
        "songlistbot",
        "streamcaptainbot",
        "kofistreambot",
        "rainmaker",
        "mrsmalvic",
        "buttsbot",
        "creatisbot",
        "cloudbot",
        "restreambot",
        "pretzelrocks",
        "twitchprimereminder",
        "blerp",
        "mikuia",
        "lacyjessica",
        "0ax2",
        "apricotdrupelet",
        "amazeful",
        "communityshowcase",
        "v_and_k",
        "electricallongboard",
        "feuerwehr",
        "jobi_gg",
        "abbottcostello",
        "aliceydra",
        "ankhbot",
        "coebot",
        "deepbot",
        "hnlbot",
        "lanfusion",
        "muxybot",
        "phantombot",
        "revlobot",
        "scottybot",
        "slotsbot",
        "ssakdook",
        "streamjar",
        "xanbot",
        "zloycabuk",
        "pixel__bot",
        "lmaobot",
    ])
});

/// True if the username is on the denylist, ends with "bot", or contains
/// "_bot". Case-insensitive; empty input is never a bot.
pub fn is_bot(username: &str) -> bool {
    if username.is_empty() {
        return false;
    }

    let lower = username.to_lowercase();
    BOT_LIST.contains(lower.as_str()) || lower.ends_with("bot") || lower.contains("_bot")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denylist_matches_any_casing() {
        assert!(is_bot("nightbot"));
        assert!(is_bot("NightBot"));
        assert!(is_bot("STREAMELEMENTS"));
        assert!(is_bot("mrsmalvic"));
    }

    #[test]
    fn suffix_and_infix_heuristics() {
        assert!(is_bot("somerandombot"));
        assert!(is_bot("SomeRandomBOT"));
        assert!(is_bot("my_bot_thing"));
        assert!(is_bot("x_bot"));
    }

    #[test]
    fn regular_users_pass() {
        assert!(!is_bot("alice"));
        assert!(!is_bot("botanist_fan")); // "_bot" must be literal
        assert!(!is_bot("abbot_")); // does not end with "bot"
    }

    #[test]
    fn empty_is_not_a_bot() {
        assert!(!is_bot(""));
    }
}
