use std::cmp::{max, min};
use std::collections::HashMap;
use std::fs::read_to_string;

use tflite::ops::builtin::BuiltinOpResolver;
use tflite::{FlatBufferModel, Interpreter, InterpreterBuilder};

use crate::app::config::DetectorConfig;
use crate::camera::Frame;
use crate::pipeline::{Detection, Detections, VehicleDetector};
use crate::Error;

/// SSD-style TFLite detector. The model takes one RGB tensor and produces
/// the usual four output tensors: locations, classes, scores, count.
pub struct TFLiteDetector {
    interpreter: Interpreter<'static, BuiltinOpResolver>,
    labels: LabelMap,
    threshold: f32,
}

type LabelMap = HashMap<i32, String>;

fn parse_labels(filename: &str) -> crate::Result<LabelMap> {
    let text = read_to_string(filename)
        .map_err(|err| Error::Configuration(format!("label file {}: {}", filename, err)))?;
    let mut labels = LabelMap::new();
    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let (Some(num), Some(class)) = (parts.next(), parts.next()) else {
            continue;
        };
        let num = num.parse::<i32>().map_err(|err| {
            Error::Configuration(format!("label file {}: bad class id: {}", filename, err))
        })?;
        labels.insert(num, class.to_string());
    }
    Ok(labels)
}

impl TFLiteDetector {
    pub fn new(config: &DetectorConfig) -> crate::Result<Self> {
        let model = FlatBufferModel::build_from_file(&config.model_filename)
            .map_err(|err| Error::Configuration(format!("model load: {:?}", err)))?;
        let resolver = BuiltinOpResolver::default();
        let builder = InterpreterBuilder::new(model, resolver)
            .map_err(|err| Error::Configuration(format!("interpreter builder: {:?}", err)))?;
        let mut interpreter = builder
            .build()
            .map_err(|err| Error::Configuration(format!("interpreter build: {:?}", err)))?;
        interpreter
            .allocate_tensors()
            .map_err(|err| Error::Configuration(format!("tensor allocation: {:?}", err)))?;

        let inputs = interpreter.inputs().to_vec();
        if inputs.len() != 1 {
            return Err(Error::Configuration(format!(
                "model has {} input tensors, expected 1",
                inputs.len()
            )));
        }
        let outputs = interpreter.outputs().to_vec();
        if outputs.len() != 4 {
            return Err(Error::Configuration(format!(
                "model has {} output tensors, expected 4",
                outputs.len()
            )));
        }

        interpreter.set_num_threads(config.num_threads as i32);

        let labels = parse_labels(&config.label_filename)?;
        Ok(Self {
            interpreter,
            labels,
            threshold: config.threshold,
        })
    }
}

impl VehicleDetector for TFLiteDetector {
    fn detect(&mut self, frame: &Frame) -> crate::Result<Detections> {
        let inputs = self.interpreter.inputs().to_vec();
        let input_index = inputs[0];
        let mut input = self
            .interpreter
            .tensor_data_mut(input_index)
            .map_err(|err| Error::Detector(format!("input tensor: {:?}", err)))?;
        let input_len = input.len();
        if frame.data.len() < input_len {
            return Err(Error::Detector(format!(
                "frame is {} bytes, model expects {}",
                frame.data.len(),
                input_len
            )));
        }
        input[..input_len].copy_from_slice(&frame.data[..input_len]);
        self.interpreter
            .invoke()
            .map_err(|err| Error::Detector(format!("invoke: {:?}", err)))?;

        let outputs = self.interpreter.outputs().to_vec();
        let locations: &[f32] = self
            .interpreter
            .tensor_data(outputs[0])
            .map_err(|err| Error::Detector(format!("locations tensor: {:?}", err)))?;
        let classes: &[f32] = self
            .interpreter
            .tensor_data(outputs[1])
            .map_err(|err| Error::Detector(format!("classes tensor: {:?}", err)))?;
        let scores: &[f32] = self
            .interpreter
            .tensor_data(outputs[2])
            .map_err(|err| Error::Detector(format!("scores tensor: {:?}", err)))?;
        let raw_count: &[f32] = self
            .interpreter
            .tensor_data(outputs[3])
            .map_err(|err| Error::Detector(format!("count tensor: {:?}", err)))?;
        let num_detections = raw_count[0] as usize;

        let width = frame.width as f32;
        let height = frame.height as f32;
        let mut detections = Detections::new();
        for index in 0..num_detections {
            let score = scores[index];
            if score <= self.threshold {
                continue;
            }
            let ymin = max(0, (height * locations[4 * index]) as i32);
            let xmin = max(0, (width * locations[4 * index + 1]) as i32);
            let ymax = min(height as i32 - 1, (height * locations[4 * index + 2]) as i32);
            let xmax = min(width as i32 - 1, (width * locations[4 * index + 3]) as i32);
            let class_num = classes[index] as i32;
            let class = self
                .labels
                .get(&class_num)
                .cloned()
                .unwrap_or_else(|| "?".to_string());
            tracing::trace!(
                "det class {class_num} with score {score} at {xmin},{ymin} - {xmax},{ymax}"
            );
            detections.push(Detection {
                xmin,
                ymin,
                xmax,
                ymax,
                score,
                class,
            });
        }
        Ok(detections)
    }
}
