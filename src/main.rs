mod car_configurator;

fn main() {
    car_configurator::app::run();
}
