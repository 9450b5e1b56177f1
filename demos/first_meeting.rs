//! Two characters meet, twice: once friendly, once shy.
//!
//! Plays the same story with each menu choice using the headless
//! presentation, then saves the friendly run and prints the transcript.
//!
//! Run with: cargo run --example first_meeting

use narrative_script::core::game::Game;
use narrative_script::core::persist::RonFileStore;
use narrative_script::core::presentation::Headless;
use narrative_script::elements::character::CharacterConfig;
use narrative_script::elements::condition::Lambda;
use narrative_script::elements::scene::SceneConfig;
use narrative_script::elements::{Handle, Story};
use narrative_script::schema::sentence::{Sentence, Word};
use narrative_script::GameError;

fn build(game: &mut Game) -> Result<Handle<Story>, GameError> {
    let world = game.world_mut();
    let mira = world.character(
        "Mira",
        CharacterConfig {
            color: Some("#9cf".to_string()),
        },
    );
    let jun = world.character("Jun", CharacterConfig::default());
    let station = world.scene("Station", SceneConfig::default());
    let story = world.story("first meeting");

    let opening = world
        .with(station)
        .set_background("station_night.png")
        .take_actions()?;
    let hello = world
        .with(mira)
        .say(Sentence::from(vec![
            Word::new("Is this the last train "),
            Word::colored("north", "#fc6"),
            Word::new("?"),
        ]))
        .take_actions()?;

    let talk = world.with(jun).say("It is. I'm Jun.").take_actions()?;
    let introduce = world.script(|ctx| {
        if let Err(e) = ctx.store.set("game", "introduced", true) {
            tracing::warn!(error = %e, "flag not set");
        }
        None
    });
    let remember = world.with(introduce).to_action()?;
    let nod = world.with(jun).say("(nods)").take_actions()?;
    let menu = world.menu(Some(Sentence::from("Jun...")));
    let answer = world
        .with(menu)
        .choose("Introduces himself", [talk, vec![remember]])
        .choose("Just nods", [nod])
        .to_action()?;

    let named = world.with(mira).say("Nice to meet you, Jun.").take_actions()?;
    let unnamed = world.with(mira).say("...Thanks, I guess.").take_actions()?;
    let reaction = world.condition();
    let react = world
        .with(reaction)
        .when(Lambda::flag("game", "introduced"), [named])
        .otherwise([unnamed])
        .to_action()?;

    let unit = world
        .with(station)
        .action([opening, hello, vec![answer, react]])?;
    world.with(story).action([vec![unit]])?;
    Ok(story)
}

fn play(choice: usize) -> Result<(Game, Headless), GameError> {
    let mut game = Game::default();
    let story = build(&mut game)?;
    game.register_story(story)?;
    game.new_game();

    let mut headless = Headless::new().with_choices([choice]);
    let progress = game.play_until_blocked(&mut headless)?;
    println!("-- choice {} ({} steps) --", choice + 1, progress.results.len());
    for entry in headless.transcript() {
        println!("  {}", entry);
    }
    Ok((game, headless))
}

fn main() -> Result<(), GameError> {
    tracing_subscriber::fmt::init();

    let (mut friendly, _) = play(0)?;
    play(1)?;

    let dir = std::env::temp_dir().join("narrative-script-demo");
    let fs = RonFileStore::new(&dir);
    let saved = friendly.save_game(&fs, "friendly")?;
    println!("saved '{}' to {}", saved.name, dir.display());
    Ok(())
}
