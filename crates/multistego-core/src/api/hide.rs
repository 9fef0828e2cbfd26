use std::fs;
use std::path::{Path, PathBuf};

use crate::chain::{self, Layer};
use crate::error::{Result, StegoError};

pub fn prepare() -> HideApi {
    HideApi::default()
}

#[derive(Default, Debug)]
pub struct HideApi {
    message: Option<String>,
    data_file: Option<PathBuf>,
    through: Vec<PathBuf>,
    image: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl HideApi {
    /// Hide this text as the innermost payload.
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn use_message<S: AsRef<str>>(mut self, message: Option<S>) -> Self {
        self.message = message.map(|s| s.as_ref().to_string());
        self
    }

    /// Hide this file as the innermost payload.
    pub fn with_data_file<A: AsRef<Path>>(mut self, data_file: A) -> Self {
        self.data_file = Some(data_file.as_ref().to_path_buf());
        self
    }

    pub fn use_data_file<A: AsRef<Path>>(mut self, data_file: Option<A>) -> Self {
        self.data_file = data_file.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Add an intermediate carrier image. The payload is hidden inside it,
    /// and the loaded image becomes the payload of the next layer out.
    /// Layers are applied innermost-first in the order given.
    pub fn through_image<A: AsRef<Path>>(mut self, image: A) -> Self {
        self.through.push(image.as_ref().to_path_buf());
        self
    }

    pub fn use_through_images(mut self, images: Option<Vec<PathBuf>>) -> Self {
        self.through = images.unwrap_or_default();
        self
    }

    /// The outermost carrier image.
    pub fn with_image<A: AsRef<Path>>(mut self, image: A) -> Self {
        self.image = Some(image.as_ref().to_path_buf());
        self
    }

    /// Where the loaded outermost carrier is written.
    pub fn with_output<A: AsRef<Path>>(mut self, output: A) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    pub fn execute(self) -> Result<()> {
        self.validate()?;
        let Some(image) = self.image else {
            return Err(StegoError::CarrierNotSet);
        };
        let Some(output) = self.output else {
            return Err(StegoError::TargetNotSet);
        };

        // Outermost layers first; the through images are given innermost
        // first, so they stack up in reverse.
        let mut layers = Vec::new();
        for through in self.through.iter().rev() {
            layers.push(Layer::File(fs::read(through)?));
        }
        if let Some(data_file) = &self.data_file {
            layers.push(Layer::File(fs::read(data_file)?));
        } else if let Some(message) = &self.message {
            layers.push(Layer::Text(message.clone()));
        }

        let carrier = fs::read(&image)?;
        let loaded = chain::assemble(&carrier, &layers)?;
        fs::write(&output, loaded)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.message.is_none() && self.data_file.is_none() {
            return Err(StegoError::MissingPayload);
        }
        if self.message.is_some() && self.data_file.is_some() {
            return Err(StegoError::MissingPayload);
        }
        Ok(())
    }
}
