//! Screen elements and pages of the game client, at 1280x720.

use indexmap::IndexMap;

use crate::common::{Area, Button};
use crate::error::AppError;
use crate::ui::check::CheckCondition;
use crate::ui::page::{PageGraph, PageId};

const fn asset(name: &'static str, x1: i32, y1: i32, x2: i32, y2: i32, color: [u8; 3]) -> Button {
    Button::simple(name, Area::new(x1, y1, x2, y2), color)
}

// Page checks
pub const MAIN_CHECK: Button = asset("MAIN_CHECK", 1187, 19, 1234, 54, [232, 229, 221]);
pub const MAIN_WHITE_CHECK: Button = asset("MAIN_WHITE_CHECK", 1185, 16, 1237, 58, [250, 251, 252]);
pub const CAMPAIGN_CHECK: Button = asset("CAMPAIGN_CHECK", 120, 15, 210, 45, [203, 214, 230]);
pub const EVENT_CHECK: Button = asset("EVENT_CHECK", 120, 15, 200, 45, [214, 196, 157]);
pub const SP_CHECK: Button = asset("SP_CHECK", 120, 15, 180, 45, [197, 176, 224]);
pub const COALITION_CHECK: Button = asset("COALITION_CHECK", 118, 14, 230, 46, [236, 201, 122]);
pub const REWARD_CHECK: Button = asset("REWARD_CHECK", 120, 15, 195, 45, [212, 208, 215]);
pub const TACTICAL_CHECK: Button = asset("TACTICAL_CHECK", 120, 15, 250, 45, [181, 199, 221]);
pub const DOCK_CHECK: Button = asset("DOCK_CHECK", 120, 15, 180, 45, [206, 211, 221]);
pub const DORMMENU_CHECK: Button = asset("DORMMENU_CHECK", 120, 15, 240, 45, [237, 224, 202]);
pub const DORM_CHECK: Button = asset("DORM_CHECK", 25, 680, 70, 710, [255, 219, 130]);
pub const MEOWFFICER_CHECK: Button = asset("MEOWFFICER_CHECK", 120, 15, 260, 45, [250, 219, 167]);
pub const SHOP_CHECK: Button = asset("SHOP_CHECK", 120, 15, 180, 45, [220, 215, 198]);
pub const SUPPLY_PACK_CHECK: Button = asset("SUPPLY_PACK_CHECK", 120, 15, 250, 45, [227, 223, 214]);
pub const GUILD_CHECK: Button = asset("GUILD_CHECK", 120, 15, 190, 45, [208, 206, 197]);
pub const RAID_CHECK: Button = asset("RAID_CHECK", 1130, 650, 1250, 700, [247, 212, 119]);
pub const EXERCISE_CHECK: Button = asset("EXERCISE_CHECK", 120, 15, 210, 45, [197, 207, 224]);
pub const OS_CHECK: Button = asset("OS_CHECK", 1140, 15, 1250, 50, [96, 178, 241]);
pub const EVENT_LIST_CHECK: Button = asset("EVENT_LIST_CHECK", 120, 15, 230, 45, [227, 224, 226]);
pub const BUILD_CHECK: Button = asset("BUILD_CHECK", 120, 15, 180, 45, [210, 214, 226]);

// Navigation
pub const GOTO_MAIN: Button = asset("GOTO_MAIN", 1230, 20, 1265, 50, [238, 238, 240]);
pub const GOTO_MAIN_WHITE: Button = asset("GOTO_MAIN_WHITE", 1228, 18, 1268, 54, [82, 90, 107]);
pub const RPG_HOME: Button = asset("RPG_HOME", 1215, 15, 1265, 60, [255, 247, 230]);
pub const BACK_ARROW: Button = asset("BACK_ARROW", 20, 20, 70, 50, [222, 222, 222]);
pub const MAIN_GOTO_CAMPAIGN: Button = asset("MAIN_GOTO_CAMPAIGN", 1050, 290, 1220, 380, [243, 215, 128]);
pub const MAIN_GOTO_REWARD: Button = asset("MAIN_GOTO_REWARD", 890, 610, 980, 700, [227, 223, 226]);
pub const MAIN_GOTO_DOCK: Button = asset("MAIN_GOTO_DOCK", 480, 620, 570, 700, [224, 224, 230]);
pub const MAIN_GOTO_DORMMENU: Button = asset("MAIN_GOTO_DORMMENU", 330, 620, 420, 700, [229, 228, 231]);
pub const MAIN_GOTO_SHOP: Button = asset("MAIN_GOTO_SHOP", 180, 620, 270, 700, [226, 225, 229]);
pub const MAIN_GOTO_GUILD: Button = asset("MAIN_GOTO_GUILD", 760, 620, 840, 700, [223, 224, 228]);
pub const MAIN_GOTO_BUILD: Button = asset("MAIN_GOTO_BUILD", 620, 620, 700, 700, [226, 227, 230]);
pub const MAIN_GOTO_EVENT_LIST: Button = asset("MAIN_GOTO_EVENT_LIST", 1090, 190, 1240, 260, [208, 178, 125]);
pub const MAIN_GOTO_MEMORIES_WHITE: Button = asset("MAIN_GOTO_MEMORIES_WHITE", 1010, 580, 1110, 640, [118, 123, 145]);
pub const MAIN_TAB_SWITCH_WHITE: Button = asset("MAIN_TAB_SWITCH_WHITE", 1180, 560, 1250, 640, [99, 107, 129]);
pub const CAMPAIGN_GOTO_EVENT: Button = asset("CAMPAIGN_GOTO_EVENT", 1120, 100, 1260, 160, [236, 205, 151]);
pub const CAMPAIGN_GOTO_SP: Button = asset("CAMPAIGN_GOTO_SP", 1120, 170, 1260, 230, [200, 182, 226]);
pub const CAMPAIGN_GOTO_COALITION: Button = asset("CAMPAIGN_GOTO_COALITION", 1120, 240, 1260, 300, [239, 210, 135]);
pub const CAMPAIGN_GOTO_EXERCISE: Button = asset("CAMPAIGN_GOTO_EXERCISE", 1000, 640, 1110, 700, [200, 211, 227]);
pub const CAMPAIGN_GOTO_OS: Button = asset("CAMPAIGN_GOTO_OS", 1130, 640, 1250, 700, [100, 170, 236]);
pub const EVENT_LIST_GOTO_RAID: Button = asset("EVENT_LIST_GOTO_RAID", 520, 170, 800, 300, [241, 196, 112]);
pub const REWARD_GOTO_MAIN: Button = asset("REWARD_GOTO_MAIN", 1230, 20, 1265, 50, [240, 240, 242]);
pub const REWARD_GOTO_TACTICAL: Button = asset("REWARD_GOTO_TACTICAL", 270, 440, 400, 520, [214, 219, 230]);
pub const REWARD_GOTO_TACTICAL_WHITE: Button = asset("REWARD_GOTO_TACTICAL_WHITE", 270, 440, 400, 520, [120, 129, 150]);
pub const DORMMENU_GOTO_DORM: Button = asset("DORMMENU_GOTO_DORM", 200, 220, 420, 480, [240, 226, 198]);
pub const DORMMENU_GOTO_MEOWFFICER: Button = asset("DORMMENU_GOTO_MEOWFFICER", 860, 220, 1080, 480, [247, 220, 170]);
pub const MEOWFFICER_GOTO_DORMMENU: Button = asset("MEOWFFICER_GOTO_DORMMENU", 20, 20, 70, 50, [223, 223, 223]);
pub const SHOP_GOTO_SUPPLY_PACK: Button = asset("SHOP_GOTO_SUPPLY_PACK", 30, 560, 150, 640, [233, 226, 210]);

// Popups and overlays
pub const POPUP_CONFIRM: Button = asset("POPUP_CONFIRM", 750, 480, 900, 530, [103, 178, 239]);
pub const POPUP_SINGLE: Button = asset("POPUP_SINGLE", 570, 480, 710, 530, [104, 179, 240]);
pub const POPUP_SINGLE_WHITE: Button = asset("POPUP_SINGLE_WHITE", 570, 490, 710, 540, [82, 90, 107]);
pub const GUILD_POPUP_CANCEL: Button = asset("GUILD_POPUP_CANCEL", 400, 480, 550, 530, [176, 182, 192]);
pub const URGENT_COMMISSION: Button = asset("URGENT_COMMISSION", 560, 240, 720, 290, [235, 172, 86]);
pub const STORY_SKIP: Button = asset("STORY_SKIP", 1160, 30, 1240, 70, [236, 236, 236]);
pub const LOGIN_ANNOUNCE: Button = asset("LOGIN_ANNOUNCE", 1170, 80, 1220, 125, [228, 230, 234]);
pub const LOGIN_ANNOUNCE_2: Button = asset("LOGIN_ANNOUNCE_2", 1195, 60, 1245, 105, [231, 232, 236]);
pub const LOGIN_CHECK: Button = asset("LOGIN_CHECK", 1150, 630, 1250, 700, [218, 218, 220]);
pub const LOGIN_RETURN_SIGN: Button = asset("LOGIN_RETURN_SIGN", 560, 560, 720, 620, [247, 214, 120]);
pub const MAINTENANCE_ANNOUNCE: Button = asset("MAINTENANCE_ANNOUNCE", 1160, 100, 1210, 145, [226, 228, 232]);
pub const GET_ITEMS_1: Button = asset("GET_ITEMS_1", 560, 150, 720, 200, [235, 224, 141]);
pub const GET_ITEMS_2: Button = asset("GET_ITEMS_2", 560, 120, 720, 170, [236, 225, 143]);
pub const GET_SHIP: Button = asset("GET_SHIP", 1120, 640, 1250, 700, [221, 222, 229]);
pub const MONTHLY_PASS_NOTICE: Button = asset("MONTHLY_PASS_NOTICE", 580, 470, 700, 520, [105, 180, 238]);
pub const BATTLE_PASS_NOTICE: Button = asset("BATTLE_PASS_NOTICE", 600, 500, 690, 540, [107, 182, 236]);
pub const BATTLE_PASS_NEW_SEASON: Button = asset("BATTLE_PASS_NEW_SEASON", 430, 80, 850, 150, [248, 226, 156]);
pub const SHIPYARD_CHECK: Button = asset("SHIPYARD_CHECK", 120, 15, 230, 45, [202, 210, 228]);
pub const META_CHECK: Button = asset("META_CHECK", 120, 15, 200, 45, [190, 120, 230]);
pub const PLAYER_CHECK: Button = asset("PLAYER_CHECK", 120, 15, 230, 45, [214, 216, 224]);
pub const GAME_TIPS: Button = asset("GAME_TIPS", 360, 200, 920, 260, [245, 241, 232]);
pub const DORM_INFO: Button = asset("DORM_INFO", 1150, 100, 1200, 150, [253, 253, 253]);
pub const DORM_FEED_CANCEL: Button = asset("DORM_FEED_CANCEL", 1190, 80, 1240, 130, [219, 219, 219]);
pub const DORM_TROPHY_CONFIRM: Button = asset("DORM_TROPHY_CONFIRM", 580, 540, 700, 590, [106, 181, 239]);
pub const MEOWFFICER_INFO: Button = asset("MEOWFFICER_INFO", 1150, 90, 1200, 140, [252, 252, 252]);
pub const MEOWFFICER_BUY: Button = asset("MEOWFFICER_BUY", 540, 140, 740, 190, [244, 223, 176]);
pub const MAP_PREPARATION: Button = asset("MAP_PREPARATION", 960, 500, 1120, 560, [233, 174, 80]);
pub const FLEET_PREPARATION: Button = asset("FLEET_PREPARATION", 1000, 590, 1160, 650, [236, 178, 82]);
pub const RAID_FLEET_PREPARATION: Button = asset("RAID_FLEET_PREPARATION", 1000, 600, 1160, 660, [238, 180, 84]);
pub const MAP_PREPARATION_CANCEL: Button = asset("MAP_PREPARATION_CANCEL", 1130, 100, 1180, 150, [230, 230, 230]);
pub const AUTO_SEARCH_MENU_EXIT: Button = asset("AUTO_SEARCH_MENU_EXIT", 1050, 200, 1100, 260, [210, 213, 221]);
pub const AUTO_SEARCH_REWARD: Button = asset("AUTO_SEARCH_REWARD", 560, 560, 720, 610, [108, 183, 240]);
pub const WITHDRAW: Button = asset("WITHDRAW", 1000, 650, 1110, 700, [213, 91, 75]);
pub const EXERCISE_PREPARATION: Button = asset("EXERCISE_PREPARATION", 990, 580, 1200, 650, [238, 183, 88]);
pub const DAL_DIFFICULTY_EXIT: Button = asset("DAL_DIFFICULTY_EXIT", 1170, 60, 1230, 110, [241, 241, 243]);
pub const RESET_TICKET_POPUP: Button = asset("RESET_TICKET_POPUP", 560, 470, 720, 520, [103, 176, 236]);
pub const RESET_FLEET_PREPARATION: Button = asset("RESET_FLEET_PREPARATION", 1000, 600, 1160, 660, [104, 177, 237]);
pub const EXCHANGE_CHECK: Button = asset("EXCHANGE_CHECK", 120, 15, 240, 45, [120, 190, 244]);
pub const IDLE: Button = asset("IDLE", 300, 320, 980, 400, [40, 40, 40]);
pub const IDLE_2: Button = asset("IDLE_2", 300, 300, 980, 380, [36, 36, 36]);
pub const IDLE_3: Button = asset("IDLE_3", 300, 340, 980, 420, [44, 44, 44]);

pub const PAGE_MAIN: PageId = PageId::new("page_main");
pub const PAGE_CAMPAIGN: PageId = PageId::new("page_campaign");
pub const PAGE_EVENT: PageId = PageId::new("page_event");
pub const PAGE_SP: PageId = PageId::new("page_sp");
pub const PAGE_COALITION: PageId = PageId::new("page_coalition");
pub const PAGE_REWARD: PageId = PageId::new("page_reward");
pub const PAGE_TACTICAL: PageId = PageId::new("page_tactical");
pub const PAGE_DOCK: PageId = PageId::new("page_dock");
pub const PAGE_DORMMENU: PageId = PageId::new("page_dormmenu");
pub const PAGE_DORM: PageId = PageId::new("page_dorm");
pub const PAGE_MEOWFFICER: PageId = PageId::new("page_meowfficer");
pub const PAGE_SHOP: PageId = PageId::new("page_shop");
pub const PAGE_SUPPLY_PACK: PageId = PageId::new("page_supply_pack");
pub const PAGE_GUILD: PageId = PageId::new("page_guild");
pub const PAGE_RAID: PageId = PageId::new("page_raid");
pub const PAGE_EXERCISE: PageId = PageId::new("page_exercise");
pub const PAGE_OS: PageId = PageId::new("page_os");
pub const PAGE_EVENT_LIST: PageId = PageId::new("page_event_list");
pub const PAGE_BUILD: PageId = PageId::new("page_build");

/// Tapped in order when the current page is unknown, to get back to a known one.
pub const RECOVERY_BUTTONS: [Button; 3] = [GOTO_MAIN, GOTO_MAIN_WHITE, RPG_HOME];

pub fn standard_graph() -> Result<PageGraph, AppError> {
    PageGraph::builder()
        .page(
            PAGE_MAIN,
            Some(CheckCondition::any([MAIN_CHECK, MAIN_WHITE_CHECK])),
        )
        .page(PAGE_CAMPAIGN, Some(CAMPAIGN_CHECK.into()))
        .page(PAGE_EVENT, Some(EVENT_CHECK.into()))
        .page(PAGE_SP, Some(SP_CHECK.into()))
        .page(PAGE_COALITION, Some(COALITION_CHECK.into()))
        .page(PAGE_REWARD, Some(REWARD_CHECK.into()))
        .page(PAGE_TACTICAL, Some(TACTICAL_CHECK.into()))
        .page(PAGE_DOCK, Some(DOCK_CHECK.into()))
        .page(PAGE_DORMMENU, Some(DORMMENU_CHECK.into()))
        .page(PAGE_DORM, Some(DORM_CHECK.into()))
        .page(PAGE_MEOWFFICER, Some(MEOWFFICER_CHECK.into()))
        .page(PAGE_SHOP, Some(SHOP_CHECK.into()))
        .page(PAGE_SUPPLY_PACK, Some(SUPPLY_PACK_CHECK.into()))
        .page(PAGE_GUILD, Some(GUILD_CHECK.into()))
        .page(PAGE_RAID, Some(RAID_CHECK.into()))
        .page(PAGE_EXERCISE, Some(EXERCISE_CHECK.into()))
        .page(PAGE_OS, Some(OS_CHECK.into()))
        .page(PAGE_EVENT_LIST, Some(EVENT_LIST_CHECK.into()))
        .page(PAGE_BUILD, Some(BUILD_CHECK.into()))
        // Main
        .link(PAGE_MAIN, PAGE_CAMPAIGN, MAIN_GOTO_CAMPAIGN)
        .link(PAGE_MAIN, PAGE_REWARD, MAIN_GOTO_REWARD)
        .link(PAGE_MAIN, PAGE_DOCK, MAIN_GOTO_DOCK)
        .link(PAGE_MAIN, PAGE_DORMMENU, MAIN_GOTO_DORMMENU)
        .link(PAGE_MAIN, PAGE_SHOP, MAIN_GOTO_SHOP)
        .link(PAGE_MAIN, PAGE_GUILD, MAIN_GOTO_GUILD)
        .link(PAGE_MAIN, PAGE_BUILD, MAIN_GOTO_BUILD)
        .link(PAGE_MAIN, PAGE_EVENT_LIST, MAIN_GOTO_EVENT_LIST)
        // Campaign
        .link(PAGE_CAMPAIGN, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_CAMPAIGN, PAGE_EVENT, CAMPAIGN_GOTO_EVENT)
        .link(PAGE_CAMPAIGN, PAGE_SP, CAMPAIGN_GOTO_SP)
        .link(PAGE_CAMPAIGN, PAGE_COALITION, CAMPAIGN_GOTO_COALITION)
        .link(PAGE_CAMPAIGN, PAGE_EXERCISE, CAMPAIGN_GOTO_EXERCISE)
        .link(PAGE_CAMPAIGN, PAGE_OS, CAMPAIGN_GOTO_OS)
        .link(PAGE_EVENT, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_EVENT, PAGE_CAMPAIGN, BACK_ARROW)
        .link(PAGE_SP, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_SP, PAGE_CAMPAIGN, BACK_ARROW)
        .link(PAGE_COALITION, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_COALITION, PAGE_CAMPAIGN, BACK_ARROW)
        .link(PAGE_EXERCISE, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_OS, PAGE_MAIN, GOTO_MAIN)
        // Reward
        .link(PAGE_REWARD, PAGE_MAIN, REWARD_GOTO_MAIN)
        .link(PAGE_REWARD, PAGE_TACTICAL, REWARD_GOTO_TACTICAL)
        .link(PAGE_TACTICAL, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_TACTICAL, PAGE_REWARD, BACK_ARROW)
        // Dormitory
        .link(PAGE_DORMMENU, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_DORMMENU, PAGE_DORM, DORMMENU_GOTO_DORM)
        .link(PAGE_DORMMENU, PAGE_MEOWFFICER, DORMMENU_GOTO_MEOWFFICER)
        .link(PAGE_DORM, PAGE_DORMMENU, BACK_ARROW)
        .link(PAGE_MEOWFFICER, PAGE_DORMMENU, MEOWFFICER_GOTO_DORMMENU)
        // Shop
        .link(PAGE_SHOP, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_SHOP, PAGE_SUPPLY_PACK, SHOP_GOTO_SUPPLY_PACK)
        .link(PAGE_SUPPLY_PACK, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_SUPPLY_PACK, PAGE_SHOP, BACK_ARROW)
        // Others
        .link(PAGE_DOCK, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_GUILD, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_BUILD, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_EVENT_LIST, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_EVENT_LIST, PAGE_RAID, EVENT_LIST_GOTO_RAID)
        .link(PAGE_RAID, PAGE_MAIN, GOTO_MAIN)
        .link(PAGE_RAID, PAGE_EVENT_LIST, BACK_ARROW)
        .build()
}

/// Elements whose interval is reset after a navigation click on the key element.
///
/// Leaving main or the dormitory may pop a new-ship screen that must not be
/// dismissed by a stale match, so those clicks hold `GET_SHIP` back for a while.
pub fn click_resets(graph: &PageGraph) -> IndexMap<Button, Vec<Button>> {
    fn add(resets: &mut IndexMap<Button, Vec<Button>>, button: Button, related: &[Button]) {
        let entry = resets.entry(button).or_default();
        for r in related {
            if !entry.contains(r) {
                entry.push(*r);
            }
        }
    }

    let mut resets = IndexMap::new();
    if let Ok(main) = graph.page(PAGE_MAIN) {
        for (_, button) in main.links() {
            add(&mut resets, *button, &[GET_SHIP]);
        }
    }
    add(&mut resets, MEOWFFICER_GOTO_DORMMENU, &[GET_SHIP]);
    add(&mut resets, DORMMENU_GOTO_DORM, &[GET_SHIP]);
    add(&mut resets, DORMMENU_GOTO_MEOWFFICER, &[GET_SHIP]);
    add(&mut resets, MAIN_GOTO_REWARD, &[GET_SHIP]);
    add(&mut resets, MAIN_GOTO_CAMPAIGN, &[GET_SHIP, RAID_CHECK]);
    add(&mut resets, REWARD_GOTO_TACTICAL, &[REWARD_GOTO_TACTICAL_WHITE]);
    add(&mut resets, REWARD_GOTO_TACTICAL_WHITE, &[REWARD_GOTO_TACTICAL]);
    add(&mut resets, SHOP_GOTO_SUPPLY_PACK, &[EXCHANGE_CHECK]);
    resets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_graph_builds() {
        let graph = standard_graph().unwrap();
        assert_eq!(graph.iter_pages().count(), 19);
        assert_eq!(graph.iter_pages().next().map(|p| p.id()), Some(PAGE_MAIN));
        assert_eq!(graph.find("page_meowfficer"), Some(PAGE_MEOWFFICER));
        assert_eq!(graph.find("page_nowhere"), None);
    }

    #[test]
    fn every_page_reaches_main() {
        let graph = standard_graph().unwrap();
        let routes = graph.route_to(PAGE_MAIN).unwrap();
        for page in graph.iter_pages().filter(|p| p.id() != PAGE_MAIN) {
            assert!(routes.next_hop(page.id()).is_some(), "{} is stranded", page.id());
        }
    }

    #[test]
    fn meowfficer_routes_through_dormmenu() {
        let graph = standard_graph().unwrap();
        let routes = graph.route_to(PAGE_MEOWFFICER).unwrap();
        assert_eq!(routes.next_hop(PAGE_MAIN), Some(PAGE_DORMMENU));
        assert_eq!(routes.next_hop(PAGE_DORMMENU), Some(PAGE_MEOWFFICER));
        assert_eq!(routes.next_hop(PAGE_DORM), Some(PAGE_DORMMENU));
    }

    #[test]
    fn leaving_main_holds_back_get_ship() {
        let graph = standard_graph().unwrap();
        let resets = click_resets(&graph);
        assert_eq!(resets[&MAIN_GOTO_SHOP], vec![GET_SHIP]);
        assert_eq!(resets[&MAIN_GOTO_CAMPAIGN], vec![GET_SHIP, RAID_CHECK]);
        assert!(!resets.contains_key(&GOTO_MAIN));
    }
}
