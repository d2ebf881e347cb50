//! Rebind document writer: only bindings that differ from their default are
//! recorded, tagged with the manager's profile version.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::manager::ActionMapManager;

impl ActionMapManager {
    /// Serialize the rebind delta as an XML string.
    pub fn save_rebinds_xml(&self) -> Result<String, String> {
        let mut buffer: Vec<u8> = Vec::new();
        {
            let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);
            self.write_rebinds(&mut writer)?;
        }
        String::from_utf8(buffer).map_err(|e| format!("rebind XML not utf-8: {e}"))
    }

    /// Write the rebind delta to a file.
    pub fn save_rebinds_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let file = File::create(&path)
            .map_err(|e| format!("create {}: {e}", path.as_ref().display()))?;
        let mut writer = Writer::new_with_indent(BufWriter::new(file), b' ', 2);
        self.write_rebinds(&mut writer)
    }

    fn write_rebinds<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), String> {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| format!("xml decl: {e}"))?;

        let mut root = BytesStart::new("rebinds");
        let version = self.version().to_string();
        root.push_attribute(("version", version.as_str()));
        writer
            .write_event(Event::Start(root))
            .map_err(|e| format!("<rebinds>: {e}"))?;

        for map in self.action_maps() {
            if map.num_rebound_inputs() == 0 {
                continue;
            }

            let mut map_elem = BytesStart::new("actionmap");
            map_elem.push_attribute(("name", map.name().as_ref()));
            writer
                .write_event(Event::Start(map_elem))
                .map_err(|e| format!("<actionmap name=\"{}\">: {e}", map.name()))?;

            for action in map.actions() {
                if action.num_rebound_inputs() == 0 {
                    continue;
                }

                let mut action_elem = BytesStart::new("action");
                action_elem.push_attribute(("name", action.id().as_ref()));
                writer
                    .write_event(Event::Start(action_elem))
                    .map_err(|e| format!("<action name=\"{}\">: {e}", action.id()))?;

                for input in &action.inputs {
                    if !input.is_rebound() {
                        continue;
                    }
                    let Some(mapping) = self.device_mapping_by_type(input.device) else {
                        self.log
                            .warn("save_rebinds: failed to find device string, skipping input");
                        continue;
                    };

                    let mut rebind = BytesStart::new("rebind");
                    rebind.push_attribute(("device", mapping.name.as_ref()));
                    rebind.push_attribute(("input", input.input.as_ref()));
                    rebind.push_attribute(("defaultInput", input.default_input.as_ref()));
                    writer
                        .write_event(Event::Empty(rebind))
                        .map_err(|e| format!("rebind for {}: {e}", action.id()))?;
                }

                writer
                    .write_event(Event::End(BytesEnd::new("action")))
                    .map_err(|e| format!("</action>: {e}"))?;
            }

            writer
                .write_event(Event::End(BytesEnd::new("actionmap")))
                .map_err(|e| format!("</actionmap>: {e}"))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("rebinds")))
            .map_err(|e| format!("</rebinds>: {e}"))?;
        Ok(())
    }
}
