/// Branching integration tests: conditions, menus and re-evaluation after undo.

use narrative_script::core::config::GameConfig;
use narrative_script::core::game::Game;
use narrative_script::core::presentation::Headless;
use narrative_script::core::store::Storable;
use narrative_script::elements::character::CharacterConfig;
use narrative_script::elements::condition::{BranchKind, Lambda, LambdaCtx};
use narrative_script::elements::scene::SceneConfig;
use narrative_script::elements::Cleaner;
use narrative_script::schema::value::Value;

#[test]
fn flag_condition_follows_the_store() {
    let mut game = Game::default();
    let world = game.world_mut();
    let alice = world.character("Alice", CharacterConfig::default());
    let park = world.scene("Park", SceneConfig::default());
    let story = world.story("main");

    let yes = world.with(alice).say("We've met!").take_actions().unwrap();
    let no = world.with(alice).say("Nice to meet you.").take_actions().unwrap();
    let end = world.with(alice).say("Bye.").take_actions().unwrap();
    let condition = world.condition();
    let check = world
        .with(condition)
        .when(Lambda::flag("game", "met"), [yes])
        .otherwise([no])
        .to_action()
        .unwrap();
    let unit = world.with(park).action([vec![check], end]).unwrap();
    world.with(story).action([unit]).unwrap();

    game.register_story(story).unwrap();
    game.new_game();
    game.store_mut().set("game", "met", true).unwrap();
    let mut headless = Headless::new();
    game.play_until_blocked(&mut headless).unwrap();

    assert_eq!(headless.lines(), vec!["Alice: We've met!", "Alice: Bye."]);
    assert_eq!(
        game.world().get(condition).unwrap().last_branch(),
        Some(BranchKind::If)
    );
}

#[test]
fn new_game_forgets_flags_in_configured_namespaces() {
    let mut game = Game::new(GameConfig {
        namespaces: vec!["flags".to_string()],
        ..GameConfig::default()
    });
    let world = game.world_mut();
    let alice = world.character("Alice", CharacterConfig::default());
    let park = world.scene("Park", SceneConfig::default());
    let story = world.story("main");

    let met = world.with(alice).say("met").take_actions().unwrap();
    let new = world.with(alice).say("new").take_actions().unwrap();
    let condition = world.condition();
    let check = world
        .with(condition)
        .when(Lambda::flag("flags", "met"), [met])
        .otherwise([new])
        .to_action()
        .unwrap();
    let unit = world.with(park).action([vec![check]]).unwrap();
    world.with(story).action([unit]).unwrap();

    game.register_story(story).unwrap();
    game.new_game();
    game.store_mut().set("flags", "met", true).unwrap();
    let mut headless = Headless::new();
    game.play_until_blocked(&mut headless).unwrap();
    assert_eq!(headless.lines(), vec!["Alice: met"]);

    game.new_game();
    assert!(game.store().has_namespace("flags"));
    assert_eq!(game.store().get("flags", "met"), None);
    let mut headless = Headless::new();
    let progress = game.play_until_blocked(&mut headless).unwrap();
    assert!(progress.terminated);
    assert_eq!(headless.lines(), vec!["Alice: new"]);
}

#[test]
fn re_evaluated_condition_rejoins_the_same_continuation() {
    let mut game = Game::default();
    let world = game.world_mut();
    let alice = world.character("Alice", CharacterConfig::default());
    let park = world.scene("Park", SceneConfig::default());
    let story = world.story("main");

    let yes = world.with(alice).say("yes").take_actions().unwrap();
    let no = world.with(alice).say("no").take_actions().unwrap();
    let end = world.with(alice).say("end").take_actions().unwrap();
    let condition = world.condition();
    let check = world
        .with(condition)
        .when(Lambda::flag("game", "met"), [yes])
        .otherwise([no])
        .to_action()
        .unwrap();
    let unit = world.with(park).action([vec![check], end]).unwrap();
    world.with(story).action([unit]).unwrap();

    game.register_story(story).unwrap();
    game.new_game();
    let mut headless = Headless::new();
    game.play_until_blocked(&mut headless).unwrap();
    assert_eq!(headless.lines(), vec!["Alice: no", "Alice: end"]);

    // back to just before the condition
    for expected in ["character:say", "character:say", "condition:action"] {
        let undone = game.undo_last().unwrap().unwrap();
        assert_eq!(undone.action_type, expected);
    }
    assert_eq!(game.world().get(condition).unwrap().last_branch(), None);

    game.store_mut().set("game", "met", true).unwrap();
    game.play_until_blocked(&mut headless).unwrap();
    assert_eq!(
        headless.lines(),
        vec!["Alice: no", "Alice: end", "Alice: yes", "Alice: end"]
    );
}

#[test]
fn else_if_chain_and_no_match() {
    let mut game = Game::default();
    let world = game.world_mut();
    let alice = world.character("Alice", CharacterConfig::default());
    let park = world.scene("Park", SceneConfig::default());
    let story = world.story("main");

    let first = world.with(alice).say("first").take_actions().unwrap();
    let second = world.with(alice).say("second").take_actions().unwrap();
    let never = world.with(alice).say("never").take_actions().unwrap();
    let after = world.with(alice).say("after").take_actions().unwrap();

    let picky = world.condition();
    let pick = world
        .with(picky)
        .when(Lambda::constant(false), [first])
        .else_when(Lambda::constant(true), [second])
        .to_action()
        .unwrap();
    let none = world.condition();
    let skip = world
        .with(none)
        .when(Lambda::constant(false), [never])
        .to_action()
        .unwrap();
    let unit = world
        .with(park)
        .action([vec![pick], vec![skip], after])
        .unwrap();
    world.with(story).action([unit]).unwrap();

    game.register_story(story).unwrap();
    game.new_game();
    let mut headless = Headless::new();
    game.play_until_blocked(&mut headless).unwrap();

    assert_eq!(headless.lines(), vec!["Alice: second", "Alice: after"]);
    assert_eq!(
        game.world().get(picky).unwrap().last_branch(),
        Some(BranchKind::ElseIf(0))
    );
    assert_eq!(game.world().get(none).unwrap().last_branch(), None);
}

#[test]
fn predicate_cleanup_runs_on_undo() {
    let mut game = Game::default();
    let world = game.world_mut();
    let alice = world.character("Alice", CharacterConfig::default());
    let park = world.scene("Park", SceneConfig::default());
    let story = world.story("main");

    let counted = world.with(alice).say("counted").take_actions().unwrap();
    let condition = world.condition();
    let check = world
        .with(condition)
        .when(
            Lambda::new(|ctx: &mut LambdaCtx<'_>| {
                let seen = ctx
                    .store
                    .get("game", "seen")
                    .and_then(Value::as_number)
                    .unwrap_or(0.0);
                ctx.store.set("game", "seen", seen + 1.0).unwrap();
                ctx.resolve(true);
                let cleaner: Cleaner = Box::new(move |store: &mut Storable| {
                    store.set("game", "seen", seen).unwrap();
                });
                Some(cleaner)
            }),
            [counted],
        )
        .to_action()
        .unwrap();
    let unit = world.with(park).action([vec![check]]).unwrap();
    world.with(story).action([unit]).unwrap();

    game.register_story(story).unwrap();
    game.new_game();
    game.play_until_blocked(&mut Headless::new()).unwrap();
    assert_eq!(game.store().get("game", "seen"), Some(&Value::Number(1.0)));

    game.undo_last().unwrap();
    game.undo_last().unwrap();
    assert_eq!(game.store().get("game", "seen"), Some(&Value::Number(0.0)));
}

#[test]
fn menu_nested_in_a_condition_branch() {
    let mut game = Game::default();
    let world = game.world_mut();
    let alice = world.character("Alice", CharacterConfig::default());
    let park = world.scene("Park", SceneConfig::default());
    let story = world.story("main");

    let tea = world.with(alice).say("Tea, then.").take_actions().unwrap();
    let coffee = world.with(alice).say("Coffee, then.").take_actions().unwrap();
    let end = world.with(alice).say("Cheers.").take_actions().unwrap();
    let menu = world.menu(None);
    let order = world
        .with(menu)
        .choose("Tea", [tea])
        .choose("Coffee", [coffee])
        .to_action()
        .unwrap();
    let condition = world.condition();
    let thirsty = world
        .with(condition)
        .when(Lambda::constant(true), [vec![order]])
        .to_action()
        .unwrap();
    let unit = world.with(park).action([vec![thirsty], end]).unwrap();
    world.with(story).action([unit]).unwrap();

    game.register_story(story).unwrap();
    game.new_game();
    let mut headless = Headless::new().with_choices([1]);
    let progress = game.play_until_blocked(&mut headless).unwrap();

    assert!(progress.terminated);
    assert_eq!(headless.lines(), vec!["Alice: Coffee, then.", "Alice: Cheers."]);
}
