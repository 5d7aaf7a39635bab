//! Header export as JSON or YAML, keyed by the on-disk field names.

use anyhow::Result;
use serde::Serialize;

use dzt::structs::dataset::Channel;
use dzt::structs::header::ChannelHeader;

#[derive(Debug, Serialize)]
pub struct HeaderRecord {
    pub rh_tag: i16,
    pub rh_data: i16,
    pub rh_nsamp: i16,
    pub rh_bits: i16,
    pub rh_zero: i16,
    pub rhf_sps: f32,
    pub rhf_spm: f32,
    pub rhf_mpm: f32,
    pub rhf_position: f32,
    pub rhf_range: f32,
    pub rh_npass: i16,
    pub rhb_cdt: String,
    pub rhb_mdt: String,
    pub rh_rgain: i16,
    pub rh_nrgain: i16,
    pub rh_text: i16,
    pub rh_ntext: i16,
    pub rh_proc: i16,
    pub rh_nproc: i16,
    pub rh_nchan: i16,
    pub rhf_epsr: f32,
    pub rhf_top: f32,
    pub rhf_depth: f32,
    pub rh_xstart: f32,
    pub rh_xend: f32,
    pub rhf_servo_level: f32,
    pub rh_accomp: u8,
    pub rh_sconfig: i16,
    pub rh_spp: i16,
    pub rh_linenum: i16,
    pub rh_ystart: f32,
    pub rh_yend: f32,
    pub rh_dtype: u8,
    pub rh_antname: String,
    pub rh_version: u8,
    pub rh_name: String,
    pub rh_chksum: String,
    pub info_area: String,
    pub gps_address: [String; 2],
    pub antenna_mhz: Option<f64>,
    pub domain: String,
}

impl HeaderRecord {
    pub fn new(channel: &Channel) -> Self {
        let h: &ChannelHeader = &channel.header;
        let o = &h.opaque;
        Self {
            rh_tag: h.tag,
            rh_data: h.data,
            rh_nsamp: h.samples,
            rh_bits: h.bits,
            rh_zero: h.zero,
            rhf_sps: h.sps,
            rhf_spm: h.spm,
            rhf_mpm: h.mpm,
            rhf_position: h.position,
            rhf_range: h.range,
            rh_npass: h.npass,
            rhb_cdt: h.created.to_string(),
            rhb_mdt: h.modified.to_string(),
            rh_rgain: h.rgain,
            rh_nrgain: h.nrgain,
            rh_text: h.text,
            rh_ntext: h.ntext,
            rh_proc: h.processing,
            rh_nproc: h.nproc,
            rh_nchan: h.nchan,
            rhf_epsr: h.epsr,
            rhf_top: h.top,
            rhf_depth: h.depth,
            rh_xstart: h.x_start,
            rh_xend: h.x_end,
            rhf_servo_level: h.servo_level,
            rh_accomp: h.accessory,
            rh_sconfig: h.sconfig,
            rh_spp: h.spp,
            rh_linenum: h.line_number,
            rh_ystart: h.y_start,
            rh_yend: h.y_end,
            rh_dtype: o.dtype,
            rh_antname: h.antenna_name(),
            rh_version: o.version,
            rh_name: h.name(),
            rh_chksum: hex(&o.checksum),
            info_area: hex(&o.info_area),
            gps_address: [hex(&o.gps[0]), hex(&o.gps[1])],
            antenna_mhz: channel.antenna_mhz,
            domain: channel.domain.to_string(),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn to_json(channels: &[Channel]) -> Result<String> {
    let records: Vec<_> = channels.iter().map(HeaderRecord::new).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

pub fn to_yaml(channels: &[Channel]) -> Result<String> {
    let records: Vec<_> = channels.iter().map(HeaderRecord::new).collect();
    Ok(serde_yaml_ng::to_string(&records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dzt::structs::date::PackedDate;
    use ndarray::Array2;

    fn channel() -> Channel {
        let mut header = ChannelHeader {
            samples: 512,
            range: 50.0,
            created: PackedDate {
                sec2: 5,
                minute: 30,
                hour: 12,
                day: 2,
                month: 3,
                year: 40,
            },
            ..Default::default()
        };
        header.set_antenna_name("5103");
        header.opaque.checksum = [0xBE, 0xEF];
        let mut channel = Channel::new(header, Array2::zeros((4, 2)));
        channel.antenna_mhz = Some(400.0);
        channel
    }

    #[test]
    fn json_uses_wire_names() -> Result<()> {
        let json = to_json(&[channel()])?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        let record = &value[0];
        assert_eq!(record["rh_nsamp"], 512);
        assert_eq!(record["rhf_range"], 50.0);
        assert_eq!(record["rhb_cdt"], "2020-03-02 12:30:10");
        assert_eq!(record["rh_antname"], "5103");
        assert_eq!(record["rh_chksum"], "beef");
        assert_eq!(record["antenna_mhz"], 400.0);
        assert_eq!(record["domain"], "time");
        assert_eq!(record["info_area"].as_str().map(str::len), Some(2 * 878));
        Ok(())
    }

    #[test]
    fn invalid_date_is_rendered_raw() -> Result<()> {
        let json = to_json(&[Channel::new(ChannelHeader::default(), Array2::zeros((1, 1)))])?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(value[0]["rhb_mdt"], "invalid(0x00000000)");
        Ok(())
    }

    #[test]
    fn yaml_lists_one_record_per_channel() -> Result<()> {
        let yaml = to_yaml(&[channel(), channel()])?;
        assert_eq!(yaml.matches("rh_tag:").count(), 2);
        let records: Vec<serde_json::Value> = serde_yaml_ng::from_str(&yaml)?;
        assert_eq!(records[1]["rh_antname"], "5103");
        Ok(())
    }
}
