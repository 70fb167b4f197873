// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use failure::Error;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mandelbrot::render::{to_image, write_image};
use mandelbrot::{Kernel, Palette, RenderConfig};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const RANGE: &str = "range";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const PALETTE: &str = "palette";
const VERBOSE: &str = "verbose";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandel")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Escape-time Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the extension picks the format"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x600")
                .validator(|s| match parse_pair::<usize>(&s, 'x') {
                    Some((w, h)) if w > 0 && h > 0 => Ok(()),
                    Some(_) => Err("Output image must be at least 1x1".to_string()),
                    None => Err("Could not parse output image size".to_string()),
                })
                .help("Size of output image, WIDTHxHEIGHT"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.75,0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse center point"))
                .help("Center of the view on the complex plane, RE,IM"),
        )
        .arg(
            Arg::with_name(RANGE)
                .required(false)
                .long(RANGE)
                .short("r")
                .takes_value(true)
                .default_value("2.5")
                .validator(|s| match f64::from_str(&s) {
                    Ok(r) if r.is_finite() && r > 0.0 => Ok(()),
                    Ok(_) => Err("Range must be a positive number".to_string()),
                    Err(_) => Err("Could not parse range".to_string()),
                })
                .help("Half-width of the view along the real axis"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in solver [default: number of CPUs]"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("256")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Maximum number of iterations per point"),
        )
        .arg(
            Arg::with_name(PALETTE)
                .required(false)
                .long(PALETTE)
                .short("p")
                .takes_value(true)
                .default_value("turbo")
                .validator(|s| Palette::from_str(&s).map(|_| ()))
                .help("Color palette: turbo or gray"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .long(VERBOSE)
                .short("v")
                .help("Log debug output"),
        )
        .get_matches()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn value<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, Error> {
    matches
        .value_of(name)
        .ok_or_else(|| failure::err_msg(format!("missing value for --{}", name)))
}

fn config_from(matches: &ArgMatches) -> Result<RenderConfig, Error> {
    let (width, height) = parse_pair(value(matches, SIZE)?, 'x')
        .ok_or_else(|| failure::err_msg("Error parsing image dimensions"))?;
    let (x_center, y_center) = parse_pair(value(matches, CENTER)?, ',')
        .ok_or_else(|| failure::err_msg("Error parsing center point"))?;
    Ok(RenderConfig {
        width,
        height,
        max_iter: u32::from_str(value(matches, ITERATIONS)?)?,
        x_center,
        y_center,
        axis_range: f64::from_str(value(matches, RANGE)?)?,
    })
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let config = config_from(matches)?;
    let threads = match matches.value_of(THREADS) {
        Some(t) => usize::from_str(t)?,
        None => num_cpus::get(),
    };
    let palette = matches
        .value_of(PALETTE)
        .map(Palette::from_str)
        .unwrap_or_else(|| Ok(Palette::default()))
        .map_err(failure::err_msg)?;
    let output = value(matches, OUTPUT)?;

    let kernel = Kernel::detect(threads);
    info!(kernel = kernel.name(), ?config, "rendering");
    let (grid, field) = mandelbrot::mandelbrot(&config, kernel)?;

    let extent = grid.extent();
    info!(
        re_min = extent.re_min,
        re_max = extent.re_max,
        im_min = extent.im_min,
        im_max = extent.im_max,
        "plotted extent"
    );
    write_image(&to_image(&field, palette), output)?;
    info!(output, "done");
    Ok(())
}

fn main() {
    let matches = args();
    init_logging(matches.is_present(VERBOSE));

    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
