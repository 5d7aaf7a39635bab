use anyhow::Result;
use indicatif::MultiProgress;

use super::command::{Cli, HeaderFormat, InfoArgs};
use super::progress::{create_spinner, finish_spinner};
use crate::export::header;
use dzt::process::decode::Decoder;
use dzt::structs::dataset::{Channel, Dataset};

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Reading DZT file: {}", args.input.display());

    let pb = create_spinner(multi, "Decoding...")?;
    let decoder = Decoder::new(args.decode.to_options(cli.fail_level()));
    let decoded = decoder.read_path(&args.input)?;
    finish_spinner(pb, format!("Decoded {}", decoded.dataset.label()));

    if !decoded.warnings.is_empty() {
        log::info!("{} warning(s) while decoding", decoded.warnings.len());
    }

    let dataset = &decoded.dataset;
    match args.header_format {
        Some(HeaderFormat::Json) => println!("{}", header::to_json(dataset.channels())?),
        Some(HeaderFormat::Yaml) => print!("{}", header::to_yaml(dataset.channels())?),
        None => print_summary(dataset),
    }

    Ok(())
}

fn print_summary(dataset: &Dataset) {
    println!("File:            {}", dataset.label());
    println!("Channels:        {}", dataset.channel_count());
    println!("Traces:          {}", dataset.traces());
    println!("Extra bytes:     {}", dataset.extra.len());

    for (i, channel) in dataset.channels().iter().enumerate() {
        println!();
        print_channel(i, channel);
    }
}

fn print_channel(index: usize, channel: &Channel) {
    let h = &channel.header;
    println!("Channel {}:", index + 1);
    println!("  Samples/trace:   {} (zero offset {})", h.samples, h.zero);
    println!("  Bit depth:       {}", h.bits);
    println!("  Time range:      {} ns", h.range);
    match h.sampling_frequency() {
        Some(fs) => println!("  Sampling rate:   {:.3} GHz", fs / 1e9),
        None => println!("  Sampling rate:   unknown"),
    }
    println!("  Scans/second:    {}", h.sps);
    println!("  Scans/meter:     {}", h.spm);
    println!("  Permittivity:    {}", h.epsr);
    println!("  Created:         {}", h.created);
    println!("  Modified:        {}", h.modified);

    let antenna = h.antenna_name();
    match channel.antenna_mhz {
        Some(mhz) => println!("  Antenna:         {antenna} ({mhz} MHz)"),
        None => println!("  Antenna:         {antenna}"),
    }
    if !h.name().is_empty() {
        println!("  Name:            {}", h.name());
    }
}
