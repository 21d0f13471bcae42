use std::time::Duration;

use crate::common::Offset;
use crate::ui::catalog::*;
use crate::ui::interrupt::rules::{AppearThenClick, BoundedClick, LumaRule, RedirectRule, SettleThenClick};
use crate::ui::interrupt::InterruptChain;

const OS_FLEET_RESET_LIMIT: u32 = 5;

/// The overlays the game client can throw up during navigation, in precedence order.
///
/// Operation siren popups come first: its reset-ticket popup must be closed
/// before anything else reacts to the screen underneath. Everything that is
/// "not a page, go home" sits after the specific popups for the same reason.
pub fn default_chain() -> InterruptChain {
    let secs = Duration::from_secs;
    let offset = Offset::symmetric(30, 30);

    InterruptChain::new()
        // Operation siren
        .with_rule(AppearThenClick::new(RESET_TICKET_POPUP))
        .with_rule(
            BoundedClick::new(RESET_FLEET_PREPARATION, OS_FLEET_RESET_LIMIT)
                .hint("You haven't set any fleets in operation siren")
                .hint("Your fleets haven't satisfied the level restrictions in operation siren")
                .resets(&[FLEET_PREPARATION, RESET_TICKET_POPUP]),
        )
        .with_rule(RedirectRule::new(EXCHANGE_CHECK, GOTO_MAIN))
        // Generic popups
        .with_rule(AppearThenClick::new(POPUP_CONFIRM).interval(secs(2)))
        .with_rule(AppearThenClick::new(URGENT_COMMISSION).interval(secs(2)))
        // Main and reward page popups
        .with_rule(AppearThenClick::new(GUILD_POPUP_CANCEL).interval(secs(2)))
        .with_rule(AppearThenClick::new(LOGIN_ANNOUNCE))
        .with_rule(AppearThenClick::new(LOGIN_ANNOUNCE_2))
        .with_rule(AppearThenClick::new(GET_ITEMS_1))
        .with_rule(AppearThenClick::new(GET_ITEMS_2))
        .with_rule(
            AppearThenClick::new(GET_SHIP)
                .offset(Offset::NONE)
                .interval(secs(5)),
        )
        .with_rule(AppearThenClick::new(LOGIN_RETURN_SIGN))
        .with_rule(
            RedirectRule::new(EVENT_LIST_CHECK, GOTO_MAIN)
                .interval(secs(5))
                .require_visible(),
        )
        .with_rule(AppearThenClick::new(MONTHLY_PASS_NOTICE))
        .with_rule(AppearThenClick::new(BATTLE_PASS_NOTICE))
        .with_rule(RedirectRule::new(BATTLE_PASS_NEW_SEASON, BACK_ARROW))
        .with_rule(AppearThenClick::new(POPUP_SINGLE).offset(Offset::new(6, -48, 54, 88)))
        .with_rule(AppearThenClick::new(POPUP_SINGLE_WHITE))
        .with_rule(
            RedirectRule::new(SHIPYARD_CHECK, GOTO_MAIN)
                .interval(secs(5))
                .require_visible(),
        )
        .with_rule(
            RedirectRule::new(META_CHECK, GOTO_MAIN)
                .interval(secs(5))
                .require_visible(),
        )
        .with_rule(RedirectRule::new(PLAYER_CHECK, GOTO_MAIN).fallback(BACK_ARROW))
        // Story
        .with_rule(AppearThenClick::new(STORY_SKIP).interval(secs(2)))
        .with_rule(RedirectRule::new(GAME_TIPS, GOTO_MAIN).interval(secs(2)))
        // Dormitory
        .with_rule(RedirectRule::new(DORM_INFO, DORM_INFO).similarity(0.75))
        .with_rule(AppearThenClick::new(DORM_FEED_CANCEL))
        .with_rule(AppearThenClick::new(DORM_TROPHY_CONFIRM))
        // Meowfficer
        .with_rule(AppearThenClick::new(MEOWFFICER_INFO).resets(&[GET_SHIP]))
        .with_rule(RedirectRule::new(MEOWFFICER_BUY, BACK_ARROW).resets(&[GET_SHIP]))
        // Accidentally entered preparation screens
        .with_rule(
            RedirectRule::new(MAP_PREPARATION, MAP_PREPARATION_CANCEL)
                .or_trigger(FLEET_PREPARATION, Offset::symmetric(20, 50))
                .or_trigger(RAID_FLEET_PREPARATION, offset),
        )
        .with_rule(AppearThenClick::new(AUTO_SEARCH_MENU_EXIT).offset(Offset::symmetric(200, 30)))
        .with_rule(AppearThenClick::new(AUTO_SEARCH_REWARD).offset(Offset::symmetric(50, 50)))
        .with_rule(SettleThenClick::new(WITHDRAW, secs(2)))
        // Login
        .with_rule(AppearThenClick::new(LOGIN_CHECK))
        .with_rule(AppearThenClick::new(MAINTENANCE_ANNOUNCE))
        // Exercise
        .with_rule(RedirectRule::new(EXERCISE_PREPARATION, GOTO_MAIN).trigger_offset(Offset::NONE))
        // Coalition difficulty selection
        .with_rule(AppearThenClick::new(DAL_DIFFICULTY_EXIT).offset(Offset::symmetric(20, 20)))
        // Idle reward screens
        .with_rule(
            LumaRule::new(IDLE, REWARD_GOTO_MAIN)
                .or_check(IDLE_2)
                .or_check(IDLE_3),
        )
        .with_rule(
            RedirectRule::new(MAIN_GOTO_MEMORIES_WHITE, MAIN_TAB_SWITCH_WHITE)
                .trigger_offset(Offset::NONE),
        )
}
