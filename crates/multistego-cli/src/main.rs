use std::path::PathBuf;

use clap::{crate_description, crate_version, Arg, ArgAction, Command};
use multistego_core::{api, Result};

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("Multistego CLI")
        .version(crate_version!())
        .about(crate_description!())
        .arg_required_else_help(true)
        .subcommand(
            Command::new("hide")
                .about("Hides data in BMP and baseline JPEG images")
                .arg(
                    Arg::new("media")
                        .short('i')
                        .long("in")
                        .value_name("media file")
                        .required(true)
                        .help("Outermost carrier image (BMP or JPEG), used readonly"),
                )
                .arg(
                    Arg::new("write_to_file")
                        .short('o')
                        .long("out")
                        .value_name("output image file")
                        .required(true)
                        .help("Final image will be stored as file"),
                )
                .arg(
                    Arg::new("data_file")
                        .short('d')
                        .long("data")
                        .value_name("data file")
                        .required_unless_present("message")
                        .conflicts_with("message")
                        .help("File to hide as the innermost payload"),
                )
                .arg(
                    Arg::new("message")
                        .short('m')
                        .long("message")
                        .value_name("text message")
                        .required(false)
                        .help("A text message that will be hidden"),
                )
                .arg(
                    Arg::new("through")
                        .short('t')
                        .long("through")
                        .value_name("carrier image")
                        .action(ArgAction::Append)
                        .required(false)
                        .help(
                            "Intermediate carrier image(s), innermost first; \
                             each one hides everything given before it",
                        ),
                ),
        )
        .subcommand(
            Command::new("unveil")
                .about("Unveils every hidden layer from an image")
                .arg(
                    Arg::new("input_image")
                        .short('i')
                        .long("in")
                        .value_name("image source file")
                        .required(true)
                        .help("Source image that contains secret data"),
                )
                .arg(
                    Arg::new("output_folder")
                        .short('o')
                        .long("out")
                        .value_name("output folder")
                        .required(true)
                        .help("Recovered layers will be stored in that folder"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("hide", m)) => {
            let through = m
                .get_many::<String>("through")
                .map(|paths| paths.map(PathBuf::from).collect::<Vec<_>>());

            api::hide::prepare()
                .use_message(m.get_one::<String>("message"))
                .use_data_file(m.get_one::<String>("data_file"))
                .use_through_images(through)
                .with_image(m.get_one::<String>("media").expect("required arg"))
                .with_output(m.get_one::<String>("write_to_file").expect("required arg"))
                .execute()?;
        }
        Some(("unveil", m)) => {
            let written = api::unveil::prepare()
                .from_secret_file(m.get_one::<String>("input_image").expect("required arg"))
                .into_output_folder(m.get_one::<String>("output_folder").expect("required arg"))
                .execute()?;
            for path in written {
                println!("{}", path.display());
            }
        }
        _ => {}
    }

    Ok(())
}
