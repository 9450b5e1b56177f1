/// Preview: play a small built-in story in the terminal.
///
/// Usage: preview [--auto] [--config <path>] [--saves <dir>]
///
/// At each line:
///   <enter>        continue
///   undo           step back one action
///   save <name>    write a save
///   load <name>    restore a save's store
///   quit           exit
/// At a menu, type the number of a choice.
///
/// `--auto` plays straight through, picking the first choice of every menu.
/// Set `RUST_LOG=narrative_script=debug` to watch the interpreter.
use narrative_script::core::action::Suspended;
use narrative_script::core::awaitable::Resolution;
use narrative_script::core::config::GameConfig;
use narrative_script::core::game::{Game, Step};
use narrative_script::core::persist::RonFileStore;
use narrative_script::core::presentation::{ImageEvent, Presentation};
use narrative_script::core::world::World;
use narrative_script::elements::character::CharacterConfig;
use narrative_script::elements::condition::Lambda;
use narrative_script::elements::image::{ImageConfig, ImagePosition, Transform};
use narrative_script::elements::scene::SceneConfig;
use narrative_script::elements::sound::SoundConfig;
use narrative_script::elements::{Handle, Image, Scene, Sound, Story};
use narrative_script::schema::id::NodeId;
use narrative_script::schema::sentence::Sentence;
use narrative_script::GameError;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// What the console is waiting on.
enum Waiting {
    Line(Suspended),
    Menu(Suspended, usize),
}

/// Prints to stdout and leaves lines and menus for the prompt to resolve.
struct Console {
    auto: bool,
    waiting: Option<Waiting>,
}

impl Console {
    fn settle(future: &Suspended, resolution: Resolution) {
        if let Err(err) = future.resolve(resolution) {
            tracing::warn!(error = %err, "already resolved");
        }
    }
}

impl Presentation for Console {
    fn create_say(&mut self, _node: NodeId, sentence: &Sentence, future: Suspended) {
        match &sentence.character {
            Some(name) => println!("{}: {}", name, sentence),
            None => println!("{}", sentence),
        }
        if self.auto {
            Self::settle(&future, Resolution::Continue);
        } else {
            self.waiting = Some(Waiting::Line(future));
        }
    }

    fn create_menu(
        &mut self,
        _node: NodeId,
        prompt: Option<&Sentence>,
        choices: &[Sentence],
        future: Suspended,
    ) {
        if let Some(prompt) = prompt {
            println!("{}", prompt);
        }
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}. {}", i + 1, choice);
        }
        if self.auto {
            Self::settle(&future, Resolution::Choose(0));
        } else {
            self.waiting = Some(Waiting::Menu(future, choices.len()));
        }
    }

    fn set_scene(&mut self, scene: &Scene) {
        println!("\n== {} ==", scene.name());
    }

    fn set_background(&mut self, src: &str, future: Suspended) {
        println!("[background: {}]", src);
        Self::settle(&future, Resolution::Continue);
    }

    fn sleep(&mut self, duration: Duration, future: Suspended) {
        println!("...");
        if !self.auto {
            std::thread::sleep(duration);
        }
        Self::settle(&future, Resolution::Continue);
    }

    fn add_image(&mut self, id: &str, image: &Image) {
        tracing::debug!(id, image = image.name(), "image added");
    }

    fn animate_image(&mut self, id: &str, event: ImageEvent, future: Suspended) {
        println!("[{} {}]", id, event.name());
        Self::settle(&future, Resolution::Continue);
    }

    fn play_sound(&mut self, sound: &Sound, future: Option<Suspended>) {
        println!("[sound: {}]", sound.config().src);
        if let Some(future) = future {
            Self::settle(&future, Resolution::Continue);
        }
    }

    fn stop_sound(&mut self, sound: &Sound) {
        println!("[sound stopped: {}]", sound.name());
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut auto = false;
    let mut config_path = None;
    let mut saves_dir = String::from(".");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--auto" => auto = true,
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--saves" if i + 1 < args.len() => {
                i += 1;
                saves_dir = args[i].clone();
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => match GameConfig::load_from_ron(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };

    let mut game = Game::new(config);
    let story = match build_story(game.world_mut()) {
        Ok(story) => story,
        Err(e) => {
            eprintln!("Failed to build story: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = game.register_story(story) {
        eprintln!("Failed to register story: {}", e);
        std::process::exit(1);
    }
    game.new_game();

    let fs = RonFileStore::new(saves_dir);
    let mut console = Console {
        auto,
        waiting: None,
    };
    if let Err(e) = run(&mut game, &mut console, &fs) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(game: &mut Game, console: &mut Console, fs: &RonFileStore) -> Result<(), GameError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        match game.next(console)? {
            Step::Advanced(_) => continue,
            Step::Terminated => {
                println!("\n-- The End --");
                return Ok(());
            }
            Step::Suspended(future) if future.is_solved() => continue,
            Step::Suspended(_) => {}
        }

        let Some(waiting) = console.waiting.take() else {
            continue;
        };
        loop {
            print!("> ");
            io::stdout().flush().ok();
            let mut line = String::new();
            if input.read_line(&mut line).unwrap_or(0) == 0 {
                return Ok(());
            }
            let line = line.trim();

            match (line.split_once(' '), line) {
                (_, "quit") | (_, "exit") => return Ok(()),
                (_, "undo") => {
                    match game.undo_last()? {
                        Some(result) => println!("(undid {})", result.action_type),
                        None => println!("(nothing to undo)"),
                    }
                    break;
                }
                (Some(("save", name)), _) => {
                    let saved = game.save_game(fs, name.trim())?;
                    println!("(saved {})", saved.name);
                }
                (Some(("load", name)), _) => {
                    let saved = game.load_game(fs, name.trim())?;
                    println!("(loaded {} from {})", saved.name, saved.meta.updated);
                }
                _ => match &waiting {
                    Waiting::Line(future) => {
                        Console::settle(future, Resolution::Continue);
                        break;
                    }
                    Waiting::Menu(future, count) => match line.parse::<usize>() {
                        Ok(n) if n >= 1 && n <= *count => {
                            Console::settle(future, Resolution::Choose(n - 1));
                            break;
                        }
                        _ => println!("Pick 1-{}", count),
                    },
                },
            }
        }
    }
}

fn build_story(world: &mut World) -> Result<Handle<Story>, GameError> {
    let alice = world.character(
        "Alice",
        CharacterConfig {
            color: Some("#f7a".to_string()),
        },
    );
    let bob = world.character("Bob", CharacterConfig::default());
    let park = world.scene(
        "The Park",
        SceneConfig {
            background: Some("park.png".to_string()),
        },
    );
    let cafe = world.scene("The Cafe", SceneConfig::default());
    let birds = world.sound("birds", SoundConfig::new("birds.ogg").looping());
    let portrait = world.image("alice", ImageConfig::new("alice.png"))?;
    let story = world.story("preview");

    let greeting = world
        .with(alice)
        .say("Oh! Hello there.")
        .say("I don't think we've met.")
        .take_actions()?;
    let entrance = world
        .with(portrait)
        .set_position(ImagePosition::Left, Transform::default())
        .show(Transform::fade(Duration::from_millis(300)))
        .take_actions()?;
    let ambience = world.with(birds).play().take_actions()?;

    let friendly = world
        .with(bob)
        .say("I'm Bob. Lovely day for it.")
        .take_actions()?;
    let friendly_flag = world.script(|ctx| {
        if let Err(e) = ctx.store.set("game", "friendly", true) {
            tracing::warn!(error = %e, "could not set flag");
        }
        None
    });
    let remember = world.with(friendly_flag).to_action()?;
    let shy = world.with(bob).say("...").take_actions()?;

    let menu = world.menu(Some(Sentence::from("How does Bob answer?")));
    let answer = world
        .with(menu)
        .choose("Introduce himself", [friendly, vec![remember]])
        .choose("Stay quiet", [shy])
        .to_action()?;

    let warm = world
        .with(alice)
        .say("Coffee's on me, Bob.")
        .take_actions()?;
    let cold = world
        .with(alice)
        .say("Well. This is awkward.")
        .take_actions()?;
    let mood = world.condition();
    let later = world
        .with(mood)
        .when(Lambda::flag("game", "friendly"), [warm])
        .otherwise([cold])
        .to_action()?;
    let pause = world
        .with(cafe)
        .sleep(Duration::from_millis(500))
        .take_actions()?;

    let first = world
        .with(park)
        .action([ambience, entrance, greeting, vec![answer]])?;
    let second = world.with(cafe).action([pause, vec![later]])?;
    world.with(story).action([vec![first, second]])?;
    Ok(story)
}

fn print_usage() {
    eprintln!("Usage: preview [--auto] [--config <path>] [--saves <dir>]");
    eprintln!();
    eprintln!("Commands at a line: <enter>, undo, save <name>, load <name>, quit");
    eprintln!("At a menu: the number of a choice");
}
