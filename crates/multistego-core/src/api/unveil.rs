use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::chain::{self, Unveiled};
use crate::error::{Result, StegoError};

pub fn prepare() -> UnveilApi {
    UnveilApi::default()
}

#[derive(Default, Debug)]
pub struct UnveilApi {
    secret_media: Option<PathBuf>,
    output_folder: Option<PathBuf>,
}

impl UnveilApi {
    /// The outermost carrier image holding the chain.
    pub fn from_secret_file(mut self, secret_image: impl AsRef<Path>) -> Self {
        self.secret_media = Some(secret_image.as_ref().to_path_buf());
        self
    }

    /// Folder where every recovered layer is written.
    pub fn into_output_folder(mut self, output_folder: impl AsRef<Path>) -> Self {
        self.output_folder = Some(output_folder.as_ref().to_path_buf());
        self
    }

    /// Peel the chain and write one file per recovered layer. Image layers
    /// become `layer-N.bmp`/`layer-N.jpg`, a terminal text becomes
    /// `secret-message.txt`. Returns the written paths, outermost first.
    pub fn execute(self) -> Result<Vec<PathBuf>> {
        let Some(secret_media) = self.secret_media else {
            return Err(StegoError::CarrierNotSet);
        };
        let Some(output_folder) = self.output_folder else {
            return Err(StegoError::TargetNotSet);
        };

        let carrier = fs::read(&secret_media)?;
        let layers = chain::disassemble(&carrier)?;

        let mut written = Vec::with_capacity(layers.len());
        for (index, layer) in layers.into_iter().enumerate() {
            let target = match layer {
                Unveiled::Image { kind, bytes } => {
                    let target =
                        output_folder.join(format!("layer-{}.{}", index + 1, kind.extension()));
                    fs::write(&target, bytes)?;
                    target
                }
                Unveiled::Text(text) => {
                    let target = output_folder.join("secret-message.txt");
                    fs::write(&target, text)?;
                    target
                }
            };
            info!("unveiled {}", target.display());
            written.push(target);
        }
        Ok(written)
    }
}
