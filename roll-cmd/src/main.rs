use dice_expression::{process_roll, roll_die, Limits, ParserResultsFilter};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn main() {
    pretty_env_logger::init();

    let mut args = std::env::args().skip(1);
    let input = match args.next() {
        // the caller-side normalization: spaces out, everything lowercase
        Some(raw) => raw.replace(' ', "").to_lowercase(),
        None => {
            eprintln!("usage: roll-cmd <expression> [repeat] [filter]");
            std::process::exit(2);
        }
    };
    let repeat = args
        .next()
        .and_then(|arg| arg.parse::<u64>().ok())
        .unwrap_or(1);
    let filter = match args.next() {
        Some(raw) => match ParserResultsFilter::from_expression(&raw) {
            Ok(filter) => filter,
            Err(error) => {
                eprintln!("{}", error);
                std::process::exit(2);
            }
        },
        None => None,
    };

    let mut master_rng = ChaCha20Rng::from_entropy();
    let mut seed: <Xoshiro256PlusPlus as SeedableRng>::Seed = Default::default();
    master_rng.fill(&mut seed);
    let mut rng = Xoshiro256PlusPlus::from_seed(seed);

    let outcomes = process_roll(&input, repeat, filter, &Limits::default(), |sides| {
        roll_die(&mut rng, sides)
    });

    let mut failed = false;
    for outcome in &outcomes {
        if !outcome.results.is_empty() {
            println!(
                "{} = {}",
                outcome.expression.original_expression,
                outcome.reduce()
            );
            for result in &outcome.results {
                for rolls in &result.roll_outputs {
                    println!("  {}", rolls);
                }
            }
        }
        if let Some(error) = &outcome.error {
            eprintln!("{}", error);
            failed = true;
        }
    }
    if failed {
        std::process::exit(1);
    }
}
